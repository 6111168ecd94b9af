use thiserror::Error;
use voxsign_types::ConnectionStatus;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("microphone unavailable: {0}")]
    Microphone(String),

    #[error("peer connection error: {0}")]
    PeerConnection(String),

    #[error("event channel error: {0}")]
    EventChannel(String),

    #[error("signaling error: {0}")]
    Signaling(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("event serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("event channel is not open")]
    ChannelClosed,

    #[error("transport is busy: {0}")]
    Busy(&'static str),

    #[error("session is not ready (status: {0:?})")]
    NotReady(ConnectionStatus),

    #[error("remote audio playback was blocked until a user gesture")]
    PlaybackBlocked,
}
