//! The seam between session plumbing and the platform media stack.
//!
//! Capture devices, peer connections and data channels are provided by the
//! host (a browser shell, a native WebRTC binding, or a test double). The
//! transport drives a [`MediaBackend`] through a fixed setup order and never
//! touches platform handles directly.

use crate::error::VoiceError;
use async_trait::async_trait;
use tokio::sync::mpsc;

#[async_trait]
pub trait MediaBackend: Send {
    /// Opens the local microphone. Fails with [`VoiceError::Microphone`] when
    /// permission is denied or no device exists.
    async fn acquire_microphone(&mut self) -> Result<(), VoiceError>;

    /// Creates the peer connection that carries audio both ways.
    async fn open_peer_connection(&mut self) -> Result<(), VoiceError>;

    /// Adds the captured microphone track to the peer connection.
    async fn attach_microphone(&mut self) -> Result<(), VoiceError>;

    /// Opens the ordered event channel. Inbound text messages are delivered
    /// on the returned receiver, which closes when the channel does.
    async fn open_event_channel(
        &mut self,
        label: &str,
    ) -> Result<mpsc::UnboundedReceiver<String>, VoiceError>;

    /// Creates the local SDP offer and installs it as the local description.
    async fn create_offer(&mut self) -> Result<String, VoiceError>;

    /// Installs the remote answer SDP.
    async fn apply_answer(&mut self, sdp: &str) -> Result<(), VoiceError>;

    /// Starts playing the remote audio track. Returns
    /// [`VoiceError::PlaybackBlocked`] when the platform requires a user
    /// gesture first; that outcome is not fatal to the session.
    async fn start_playback(&mut self) -> Result<(), VoiceError>;

    /// Sends one text message on the event channel.
    async fn send(&mut self, payload: &str) -> Result<(), VoiceError>;

    fn is_channel_open(&self) -> bool;

    /// Stops every track and closes the channel and peer connection.
    /// Must be safe to call repeatedly and after a partial setup.
    async fn close(&mut self);

    /// Synchronous release used when a live transport is dropped without
    /// [`close`](Self::close), e.g. when its task is aborted. Must not block;
    /// stopping tracks and closing handles without awaiting is enough.
    fn release(&mut self) {}
}
