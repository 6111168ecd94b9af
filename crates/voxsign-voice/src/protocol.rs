//! JSON codec for the realtime session's event channel.
//!
//! Outbound control messages are a tagged [`ClientEvent`]. Inbound messages
//! are decoded into the small [`TransportEvent`] vocabulary the controller
//! understands; everything else the remote side emits is dropped here.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Output modalities requested for every session and response.
const MODALITIES: [&str; 2] = ["audio", "text"];

fn modalities() -> Vec<String> {
    MODALITIES.iter().map(|m| m.to_string()).collect()
}

/// Transcription settings for captured user audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Remote session behavior pushed with `session.update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    pub modalities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<TranscriptionConfig>,
    /// Always serialized as `null`: server-side turn detection stays off and
    /// the client decides when a turn ends.
    pub turn_detection: Option<serde_json::Value>,
}

impl SessionConfig {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            voice: None,
            modalities: modalities(),
            input_audio_transcription: None,
            turn_detection: None,
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn with_transcription(mut self, transcription: TranscriptionConfig) -> Self {
        self.input_audio_transcription = Some(transcription);
        self
    }
}

/// Per-response overrides sent with `response.create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseConfig {
    pub modalities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl ResponseConfig {
    pub fn with_instructions(instructions: impl Into<String>) -> Self {
        Self {
            modalities: modalities(),
            instructions: Some(instructions.into()),
        }
    }
}

/// Control messages sent to the remote session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionConfig },

    #[serde(rename = "response.create")]
    ResponseCreate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response: Option<ResponseConfig>,
    },

    #[serde(rename = "response.cancel")]
    ResponseCancel,

    #[serde(rename = "input_audio_buffer.clear")]
    InputAudioBufferClear,

    #[serde(rename = "input_audio_buffer.commit")]
    InputAudioBufferCommit,
}

impl ClientEvent {
    /// The wire `type` of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionUpdate { .. } => "session.update",
            Self::ResponseCreate { .. } => "response.create",
            Self::ResponseCancel => "response.cancel",
            Self::InputAudioBufferClear => "input_audio_buffer.clear",
            Self::InputAudioBufferCommit => "input_audio_buffer.commit",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Normalized inbound events, as seen by the turn-taking controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The user's committed audio was transcribed.
    TranscriptCompleted(String),
    /// Transcription of the committed audio failed; nothing usable was heard.
    TranscriptionFailed(String),
    /// The model opened a new response.
    ResponseStarted(String),
    /// A fragment of the text the model is currently speaking.
    SpeechTextDelta(String),
    /// The model finished or abandoned a response.
    SpeechCompleted {
        response_id: Option<String>,
        /// The response was cut short by `response.cancel`.
        cancelled: bool,
    },
    /// The remote side reported an error.
    TransportError {
        code: Option<String>,
        message: String,
    },
    /// Remote audio could not start playing without a user gesture.
    PlaybackBlocked,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseSummary {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ServerEvent {
    #[serde(rename = "conversation.item.input_audio_transcription.completed")]
    TranscriptionCompleted {
        #[serde(default)]
        transcript: String,
    },

    #[serde(rename = "conversation.item.input_audio_transcription.failed")]
    TranscriptionFailed {
        #[serde(default)]
        error: Option<ErrorDetail>,
    },

    #[serde(rename = "response.created")]
    ResponseCreated {
        #[serde(default)]
        response: Option<ResponseSummary>,
    },

    #[serde(
        rename = "response.audio_transcript.delta",
        alias = "response.output_audio_transcript.delta",
        alias = "response.text.delta"
    )]
    TextDelta {
        #[serde(default)]
        delta: String,
    },

    #[serde(rename = "response.done")]
    ResponseDone {
        #[serde(default)]
        response: Option<ResponseSummary>,
    },

    #[serde(rename = "error")]
    Error { error: ErrorDetail },

    #[serde(other)]
    Other,
}

/// Decodes one inbound event-channel message.
///
/// Returns `None` for event types the controller does not act on and for
/// malformed JSON, which is logged and dropped.
pub fn decode_server_event(raw: &str) -> Option<TransportEvent> {
    let event: ServerEvent = match serde_json::from_str(raw) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, len = raw.len(), "dropping malformed realtime event");
            return None;
        }
    };

    match event {
        ServerEvent::TranscriptionCompleted { transcript } => {
            Some(TransportEvent::TranscriptCompleted(transcript))
        }
        ServerEvent::TranscriptionFailed { error } => {
            let message = error.map(|e| e.message).unwrap_or_default();
            debug!(%message, "transcription failed");
            Some(TransportEvent::TranscriptionFailed(message))
        }
        ServerEvent::ResponseCreated { response } => match response.and_then(|r| r.id) {
            Some(id) => Some(TransportEvent::ResponseStarted(id)),
            None => {
                debug!("response.created without an id");
                None
            }
        },
        ServerEvent::TextDelta { delta } => Some(TransportEvent::SpeechTextDelta(delta)),
        ServerEvent::ResponseDone { response } => {
            let ResponseSummary { id, status } = response.unwrap_or_default();
            debug!(
                id = id.as_deref().unwrap_or("unknown"),
                status = status.as_deref().unwrap_or("unknown"),
                "response done"
            );
            Some(TransportEvent::SpeechCompleted {
                response_id: id,
                cancelled: status.as_deref() == Some("cancelled"),
            })
        }
        ServerEvent::Error { error } => Some(TransportEvent::TransportError {
            code: error.code,
            message: error.message,
        }),
        ServerEvent::Other => None,
    }
}
