use thiserror::Error;
use voxsign_voice::VoiceError;

use crate::account::AccountError;

#[derive(Error, Debug)]
pub enum SignupError {
    #[error("voice session error: {0}")]
    Voice(#[from] VoiceError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error("transport event stream was already taken")]
    EventStreamTaken,

    #[error("signup was closed before it completed")]
    Cancelled,
}
