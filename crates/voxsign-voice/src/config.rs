use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_signaling_url() -> String {
    "http://127.0.0.1:3000/api/realtime/session".to_string()
}

fn default_voice() -> String {
    "alloy".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_min_hold_ms() -> u64 {
    500
}

fn default_max_capture_secs() -> u64 {
    10
}

fn default_signaling_timeout_secs() -> u64 {
    15
}

fn default_processing_timeout_secs() -> u64 {
    8
}

/// Client-side settings for the realtime speech session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Signaling endpoint that trades an SDP offer for an answer.
    #[serde(default = "default_signaling_url")]
    pub signaling_url: String,
    /// Voice the remote model speaks with.
    #[serde(default = "default_voice")]
    pub voice: String,
    /// Model used to transcribe the user's captured audio.
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
    /// Holds shorter than this are treated as accidental taps. Default: 500 ms.
    #[serde(default = "default_min_hold_ms")]
    pub min_hold_ms: u64,
    /// Capture stops on its own after this long. Default: 10 s.
    #[serde(default = "default_max_capture_secs")]
    pub max_capture_secs: u64,
    /// Timeout for the signaling round trip. Default: 15 s.
    #[serde(default = "default_signaling_timeout_secs")]
    pub signaling_timeout_secs: u64,
    /// A committed capture with no transcript after this long is given up
    /// as unheard. Default: 8 s.
    #[serde(default = "default_processing_timeout_secs")]
    pub processing_timeout_secs: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            signaling_url: default_signaling_url(),
            voice: default_voice(),
            transcription_model: default_transcription_model(),
            min_hold_ms: default_min_hold_ms(),
            max_capture_secs: default_max_capture_secs(),
            signaling_timeout_secs: default_signaling_timeout_secs(),
            processing_timeout_secs: default_processing_timeout_secs(),
        }
    }
}

impl RealtimeConfig {
    pub fn new(signaling_url: impl Into<String>) -> Self {
        Self {
            signaling_url: signaling_url.into(),
            ..Default::default()
        }
    }

    pub fn min_hold(&self) -> Duration {
        Duration::from_millis(self.min_hold_ms)
    }

    pub fn max_capture(&self) -> Duration {
        Duration::from_secs(self.max_capture_secs)
    }

    pub fn signaling_timeout(&self) -> Duration {
        Duration::from_secs(self.signaling_timeout_secs)
    }

    pub fn processing_timeout(&self) -> Duration {
        Duration::from_secs(self.processing_timeout_secs)
    }
}
