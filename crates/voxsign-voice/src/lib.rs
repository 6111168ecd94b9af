//! Realtime speech session plumbing for the voxsign signup flow.
//!
//! The remote speech model is a general conversational engine. This crate
//! repurposes it as a scripted announcer and a transcriber:
//!
//! - [`transport`] owns one bidirectional session: microphone, peer
//!   connection, an ordered event channel, and SDP negotiation through the
//!   signaling endpoint ([`signaling`]). The media stack itself sits behind
//!   the [`media::MediaBackend`] seam.
//! - [`protocol`] is the JSON codec for the event channel.
//! - [`controller`] enforces turn-taking: the model only speaks text it was
//!   explicitly handed, every transcript and every finished utterance
//!   re-locks the session, and unsolicited output is cancelled before it
//!   reaches the user.
//!
//! The architecture separates concerns: the signup orchestrator decides
//! *what* to say and when to listen, the controller decides *whether* the
//! session may speak, and the transport only moves bytes.

pub mod config;
pub mod controller;
pub mod error;
pub mod media;
pub mod protocol;
pub mod signaling;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use config::RealtimeConfig;
pub use controller::{CaptureOutcome, ControllerNotice, TurnController};
pub use error::VoiceError;
pub use media::MediaBackend;
pub use protocol::{ClientEvent, ResponseConfig, SessionConfig, TranscriptionConfig, TransportEvent};
pub use signaling::{SessionAnswer, SessionOffer, SignalingClient};
pub use transport::{RealtimeTransport, SessionTransport, TransportLifecycle};
