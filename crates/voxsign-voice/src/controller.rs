//! Client-side turn-taking over a realtime speech session.
//!
//! Server turn detection is disabled, so nothing is spoken or transcribed
//! unless this controller asks for it. The remote model still volunteers
//! replies on its own; every transcript and every finished utterance
//! therefore re-locks the session, and output that was not scripted through
//! [`TurnController::speak`] is cancelled as soon as it shows up.

use crate::config::RealtimeConfig;
use crate::error::VoiceError;
use crate::protocol::{ClientEvent, ResponseConfig, SessionConfig, TranscriptionConfig, TransportEvent};
use crate::transport::SessionTransport;
use std::collections::VecDeque;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};
use voxsign_types::{ConnectionStatus, Locale, SpeechKind};

/// Cancelling when nothing is generating. Expected after drift handling.
const CANCEL_NOT_ACTIVE: &str = "response_cancel_not_active";
/// A commit arrived with no buffered audio.
const COMMIT_EMPTY: &str = "input_audio_buffer_commit_empty";
/// Unsolicited response ids remembered so their late `response.done` is not
/// mistaken for the end of scripted speech.
const MAX_ABANDONED: usize = 8;

/// Who is currently allowed to produce audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechState {
    Silent,
    Scripted(SpeechKind),
    /// The model started an unrequested response; one cancel has been sent.
    Drifting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureState {
    Idle,
    Holding { started: Instant },
    Committed { at: Instant },
}

/// The response carrying the current scripted utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ScriptedResponse {
    None,
    /// `response.create` was sent; the server has not named the response yet.
    Requested,
    Started(String),
}

/// Result of releasing the capture control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Held for less than the minimum; buffered audio was cleared.
    Discarded,
    /// Audio was committed for transcription.
    Committed,
    /// No capture was in progress.
    Ignored,
}

/// What the orchestrator needs to hear about after an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerNotice {
    Transcript(String),
    /// Caption text for the utterance currently being scripted.
    SpeechText(String),
    SpeechFinished(SpeechKind),
    /// The committed capture produced no transcript.
    NothingHeard,
    PlaybackBlocked,
    Disconnected(String),
}

fn language_name(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "English",
        Locale::Ar => "Arabic",
    }
}

fn lock_instructions(locale: Locale) -> String {
    format!(
        "You are a silent transcription relay for a signup form. The user will speak {}. \
         Never reply to the user, never ask questions and never produce audio or text on your own. \
         Only speak when you receive an explicit instruction to say a specific sentence.",
        language_name(locale)
    )
}

fn verbatim_instructions(text: &str, locale: Locale) -> String {
    format!(
        "Say exactly the following {} sentence, word for word, and nothing else. \
         Do not answer it, translate it or add anything before or after it: \"{}\"",
        language_name(locale),
        text
    )
}

pub struct TurnController<T: SessionTransport> {
    transport: T,
    config: RealtimeConfig,
    locale: Locale,
    status: ConnectionStatus,
    speech: SpeechState,
    scripted: ScriptedResponse,
    abandoned: VecDeque<String>,
    capture: CaptureState,
}

impl<T: SessionTransport> TurnController<T> {
    pub fn new(transport: T, config: RealtimeConfig, locale: Locale) -> Self {
        Self {
            transport,
            config,
            locale,
            status: ConnectionStatus::Idle,
            speech: SpeechState::Silent,
            scripted: ScriptedResponse::None,
            abandoned: VecDeque::new(),
            capture: CaptureState::Idle,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn speech_state(&self) -> SpeechState {
        self.speech
    }

    /// True while a scripted utterance is playing.
    pub fn is_intentional(&self) -> bool {
        matches!(self.speech, SpeechState::Scripted(_))
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<TransportEvent>> {
        self.transport.take_events()
    }

    /// Connects the transport and pushes the initial lock. Leaves the
    /// controller idle and retryable on failure.
    pub async fn connect(&mut self) -> Result<(), VoiceError> {
        if self.status.is_connected() {
            return Ok(());
        }
        if self.status == ConnectionStatus::Connecting {
            return Err(VoiceError::Busy("connect already in progress"));
        }

        self.status = ConnectionStatus::Connecting;
        if let Err(e) = self.transport.connect().await {
            self.status = ConnectionStatus::Idle;
            return Err(e);
        }

        let lock = self.lock_config().with_transcription(TranscriptionConfig {
            model: self.config.transcription_model.clone(),
            language: Some(self.locale.code().to_string()),
        });
        if let Err(e) = self.transport.send_instruction(lock).await {
            self.transport.teardown().await;
            self.status = ConnectionStatus::Idle;
            return Err(e);
        }

        self.status = ConnectionStatus::Ready;
        self.speech = SpeechState::Silent;
        self.scripted = ScriptedResponse::None;
        self.abandoned.clear();
        self.capture = CaptureState::Idle;
        info!(locale = %self.locale, "turn controller ready");
        Ok(())
    }

    /// Has the model say `text` verbatim.
    pub async fn speak(&mut self, text: &str, kind: SpeechKind) -> Result<(), VoiceError> {
        match self.status {
            ConnectionStatus::Ready => {}
            ConnectionStatus::Speaking => return Err(VoiceError::Busy("speech in progress")),
            other => return Err(VoiceError::NotReady(other)),
        }
        if self.speech == SpeechState::Drifting {
            self.send_quietly(ClientEvent::ResponseCancel).await;
        }

        let instructions = verbatim_instructions(text, self.locale);
        self.speech = SpeechState::Scripted(kind);
        self.scripted = ScriptedResponse::Requested;
        self.status = ConnectionStatus::Speaking;
        debug!(?kind, len = text.len(), "speaking scripted utterance");

        let session = SessionConfig::new(instructions.clone()).with_voice(self.config.voice.clone());
        let sent = match self.transport.send_instruction(session).await {
            Ok(()) => {
                self.transport
                    .request_response(Some(ResponseConfig::with_instructions(instructions)))
                    .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = sent {
            self.speech = SpeechState::Silent;
            self.scripted = ScriptedResponse::None;
            self.status = ConnectionStatus::Ready;
            return Err(e);
        }
        Ok(())
    }

    /// Single dispatch point for inbound transport events.
    pub async fn handle_event(&mut self, event: TransportEvent) -> Option<ControllerNotice> {
        match event {
            TransportEvent::TranscriptCompleted(text) => {
                if !self.is_intentional() {
                    self.send_quietly(ClientEvent::ResponseCancel).await;
                }
                self.relock().await;
                self.capture = CaptureState::Idle;
                if self.status.is_connected() && !self.is_intentional() {
                    self.status = ConnectionStatus::Ready;
                }
                debug!(len = text.len(), "transcript completed");
                Some(ControllerNotice::Transcript(text))
            }
            TransportEvent::TranscriptionFailed(message) => {
                if !matches!(self.capture, CaptureState::Committed { .. }) {
                    debug!(%message, "transcription failure without a committed capture");
                    return None;
                }
                info!(%message, "transcription failed");
                self.heard_nothing()
            }
            TransportEvent::ResponseStarted(id) => {
                if self.is_intentional() && self.scripted == ScriptedResponse::Requested {
                    debug!(%id, "scripted response started");
                    self.scripted = ScriptedResponse::Started(id);
                    return None;
                }
                debug!(%id, state = ?self.speech, "response was not requested");
                self.remember_abandoned(id);
                if self.speech == SpeechState::Silent {
                    warn!("unsolicited response from model, cancelling");
                    self.speech = SpeechState::Drifting;
                    self.send_quietly(ClientEvent::ResponseCancel).await;
                }
                None
            }
            TransportEvent::SpeechTextDelta(delta) => match self.speech {
                SpeechState::Scripted(_) => Some(ControllerNotice::SpeechText(delta)),
                SpeechState::Drifting => None,
                SpeechState::Silent => {
                    warn!("unsolicited speech from model, cancelling");
                    self.speech = SpeechState::Drifting;
                    self.send_quietly(ClientEvent::ResponseCancel).await;
                    None
                }
            },
            TransportEvent::SpeechCompleted {
                response_id,
                cancelled,
            } => match self.speech {
                SpeechState::Scripted(kind) => {
                    if !self.ends_scripted(response_id.as_deref(), cancelled) {
                        debug!(
                            id = response_id.as_deref().unwrap_or("unknown"),
                            cancelled,
                            "stale response finished during scripted speech"
                        );
                        return None;
                    }
                    self.speech = SpeechState::Silent;
                    self.scripted = ScriptedResponse::None;
                    self.relock().await;
                    if self.status == ConnectionStatus::Speaking {
                        self.status = ConnectionStatus::Ready;
                    }
                    debug!(?kind, "scripted utterance finished");
                    Some(ControllerNotice::SpeechFinished(kind))
                }
                SpeechState::Silent | SpeechState::Drifting => {
                    debug!(state = ?self.speech, "ignoring unsolicited response");
                    self.speech = SpeechState::Silent;
                    self.send_quietly(ClientEvent::ResponseCancel).await;
                    self.relock().await;
                    None
                }
            },
            TransportEvent::TransportError { code, message } => match code.as_deref() {
                Some(CANCEL_NOT_ACTIVE) => {
                    debug!(%message, "ignoring benign cancel error");
                    None
                }
                Some(COMMIT_EMPTY) => {
                    info!("committed audio buffer was empty");
                    self.heard_nothing()
                }
                _ => {
                    warn!(code = code.as_deref().unwrap_or("none"), %message, "transport error, tearing down");
                    self.teardown().await;
                    Some(ControllerNotice::Disconnected(message))
                }
            },
            TransportEvent::PlaybackBlocked => Some(ControllerNotice::PlaybackBlocked),
        }
    }

    /// Arms audio capture. Only accepted while the session is ready.
    pub async fn start_capture(&mut self) -> Result<(), VoiceError> {
        if self.status != ConnectionStatus::Ready || self.capture != CaptureState::Idle {
            return Err(VoiceError::NotReady(self.status));
        }
        self.transport.clear_captured_audio().await?;
        self.capture = CaptureState::Holding {
            started: Instant::now(),
        };
        self.status = ConnectionStatus::Listening;
        debug!("capture started");
        Ok(())
    }

    /// Releases the capture control after it was held for `hold`.
    pub async fn stop_capture(&mut self, hold: Duration) -> Result<CaptureOutcome, VoiceError> {
        if !matches!(self.capture, CaptureState::Holding { .. }) {
            return Ok(CaptureOutcome::Ignored);
        }

        if hold < self.config.min_hold() {
            debug!(hold_ms = hold.as_millis() as u64, "capture too short, discarding");
            self.capture = CaptureState::Idle;
            self.status = ConnectionStatus::Ready;
            self.transport.clear_captured_audio().await?;
            return Ok(CaptureOutcome::Discarded);
        }

        self.capture = CaptureState::Committed { at: Instant::now() };
        self.status = ConnectionStatus::Processing;
        if let Err(e) = self.transport.commit_captured_audio().await {
            self.capture = CaptureState::Idle;
            self.status = ConnectionStatus::Ready;
            return Err(e);
        }
        debug!(hold_ms = hold.as_millis() as u64, "capture committed");
        Ok(CaptureOutcome::Committed)
    }

    /// How long the current capture has been held.
    pub fn held_for(&self) -> Option<Duration> {
        match self.capture {
            CaptureState::Holding { started } => Some(started.elapsed()),
            _ => None,
        }
    }

    /// When the current capture stops on its own.
    pub fn capture_deadline(&self) -> Option<Instant> {
        match self.capture {
            CaptureState::Holding { started } => Some(started + self.config.max_capture()),
            _ => None,
        }
    }

    /// Countdown for the current capture, saturating at zero.
    pub fn capture_remaining(&self) -> Option<Duration> {
        self.capture_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// When a committed capture still waiting for its transcript is given up.
    pub fn processing_deadline(&self) -> Option<Instant> {
        match self.capture {
            CaptureState::Committed { at } => Some(at + self.config.processing_timeout()),
            _ => None,
        }
    }

    /// Abandons a committed capture whose transcript is overdue and returns
    /// the session to ready. Does nothing before the deadline.
    pub fn expire_processing(&mut self) -> Option<ControllerNotice> {
        let deadline = self.processing_deadline()?;
        if Instant::now() < deadline {
            return None;
        }
        warn!("no transcript for committed capture, giving up");
        self.heard_nothing()
    }

    pub async fn unlock_playback(&mut self) -> Result<(), VoiceError> {
        self.transport.unlock_playback().await
    }

    pub async fn teardown(&mut self) {
        self.transport.teardown().await;
        self.status = ConnectionStatus::Idle;
        self.speech = SpeechState::Silent;
        self.scripted = ScriptedResponse::None;
        self.abandoned.clear();
        self.capture = CaptureState::Idle;
    }

    fn heard_nothing(&mut self) -> Option<ControllerNotice> {
        self.capture = CaptureState::Idle;
        if self.status == ConnectionStatus::Processing {
            self.status = ConnectionStatus::Ready;
        }
        Some(ControllerNotice::NothingHeard)
    }

    /// Whether a finished response is the one carrying scripted speech.
    fn ends_scripted(&self, response_id: Option<&str>, cancelled: bool) -> bool {
        match (&self.scripted, response_id) {
            (ScriptedResponse::Started(expected), Some(id)) => expected == id,
            (_, Some(id)) if self.abandoned.iter().any(|a| a == id) => false,
            // Scripted responses are never cancelled; this is the drift
            // response cancelled just before speaking.
            (ScriptedResponse::Requested, _) => !cancelled,
            _ => true,
        }
    }

    fn remember_abandoned(&mut self, id: String) {
        if self.abandoned.len() == MAX_ABANDONED {
            self.abandoned.pop_front();
        }
        self.abandoned.push_back(id);
    }

    fn lock_config(&self) -> SessionConfig {
        SessionConfig::new(lock_instructions(self.locale)).with_voice(self.config.voice.clone())
    }

    async fn relock(&mut self) {
        let lock = self.lock_config();
        if let Err(e) = self.transport.send_instruction(lock).await {
            warn!(error = %e, "failed to re-lock session");
        }
    }

    async fn send_quietly(&mut self, event: ClientEvent) {
        let kind = event.kind();
        if let Err(e) = self.transport.send(event).await {
            warn!(kind, error = %e, "failed to send control event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingTransport, TransportLog};

    async fn ready() -> (TurnController<RecordingTransport>, TransportLog) {
        let (transport, wire) = RecordingTransport::new();
        let mut controller = TurnController::new(transport, RealtimeConfig::default(), Locale::En);
        controller.connect().await.unwrap();
        wire.take_sent();
        (controller, wire)
    }

    fn done(id: Option<&str>, cancelled: bool) -> TransportEvent {
        TransportEvent::SpeechCompleted {
            response_id: id.map(str::to_string),
            cancelled,
        }
    }

    fn is_lock(event: &ClientEvent) -> bool {
        matches!(event, ClientEvent::SessionUpdate { session } if session.instructions.contains("silent transcription relay"))
    }

    #[tokio::test]
    async fn connect_pushes_lock_with_transcription_language() {
        let (transport, wire) = RecordingTransport::new();
        let mut controller = TurnController::new(transport, RealtimeConfig::default(), Locale::Ar);
        controller.connect().await.unwrap();

        assert_eq!(controller.status(), ConnectionStatus::Ready);
        let sent = wire.sent();
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            ClientEvent::SessionUpdate { session } => {
                assert!(session.turn_detection.is_none());
                let transcription = session.input_audio_transcription.as_ref().unwrap();
                assert_eq!(transcription.language.as_deref(), Some("ar"));
                assert!(session.instructions.contains("Arabic"));
            }
            other => panic!("unexpected first event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_connect_returns_to_idle_and_is_retryable() {
        let (transport, wire) = RecordingTransport::new();
        let mut controller = TurnController::new(transport, RealtimeConfig::default(), Locale::En);
        wire.fail_next_connect("microphone denied");

        assert!(controller.connect().await.is_err());
        assert_eq!(controller.status(), ConnectionStatus::Idle);

        controller.connect().await.unwrap();
        assert_eq!(controller.status(), ConnectionStatus::Ready);
    }

    #[tokio::test]
    async fn speak_sends_verbatim_instruction_then_response() {
        let (mut controller, wire) = ready().await;
        controller.speak("What is your name?", SpeechKind::Question).await.unwrap();

        assert_eq!(controller.status(), ConnectionStatus::Speaking);
        assert!(controller.is_intentional());
        let sent = wire.take_sent();
        assert_eq!(sent.len(), 2);
        assert!(matches!(&sent[0], ClientEvent::SessionUpdate { session } if session.instructions.contains("\"What is your name?\"")));
        assert!(matches!(&sent[1], ClientEvent::ResponseCreate { .. }));
    }

    #[tokio::test]
    async fn speak_requires_ready_session() {
        let (transport, _wire) = RecordingTransport::new();
        let mut controller = TurnController::new(transport, RealtimeConfig::default(), Locale::En);
        assert!(matches!(
            controller.speak("hello", SpeechKind::Greeting).await,
            Err(VoiceError::NotReady(ConnectionStatus::Idle))
        ));
    }

    #[tokio::test]
    async fn scripted_completion_relocks_and_notifies() {
        let (mut controller, wire) = ready().await;
        controller.speak("Hello", SpeechKind::Greeting).await.unwrap();
        wire.take_sent();

        let notice = controller.handle_event(done(None, false)).await;
        assert_eq!(notice, Some(ControllerNotice::SpeechFinished(SpeechKind::Greeting)));
        assert_eq!(controller.status(), ConnectionStatus::Ready);
        assert!(!controller.is_intentional());
        let sent = wire.take_sent();
        assert!(is_lock(&sent[0]), "{sent:?}");
    }

    #[tokio::test]
    async fn unsolicited_speech_is_cancelled_once_and_never_surfaced() {
        let (mut controller, wire) = ready().await;

        assert_eq!(controller.handle_event(TransportEvent::SpeechTextDelta("Sure".into())).await, None);
        assert_eq!(controller.handle_event(TransportEvent::SpeechTextDelta(", I".into())).await, None);
        assert_eq!(controller.speech_state(), SpeechState::Drifting);
        let cancels = wire
            .take_sent()
            .iter()
            .filter(|e| matches!(e, ClientEvent::ResponseCancel))
            .count();
        assert_eq!(cancels, 1);

        assert_eq!(controller.handle_event(done(None, false)).await, None);
        assert_eq!(controller.speech_state(), SpeechState::Silent);
        assert_eq!(controller.status(), ConnectionStatus::Ready);
        let sent = wire.take_sent();
        assert!(matches!(sent[0], ClientEvent::ResponseCancel));
        assert!(is_lock(&sent[1]));
    }

    #[tokio::test]
    async fn transcript_relocks_before_forwarding() {
        let (mut controller, wire) = ready().await;
        controller.start_capture().await.unwrap();
        controller.stop_capture(Duration::from_secs(2)).await.unwrap();
        assert_eq!(controller.status(), ConnectionStatus::Processing);
        wire.take_sent();

        let notice = controller
            .handle_event(TransportEvent::TranscriptCompleted("john".into()))
            .await;
        assert_eq!(notice, Some(ControllerNotice::Transcript("john".into())));
        assert_eq!(controller.status(), ConnectionStatus::Ready);
        let sent = wire.take_sent();
        assert!(matches!(sent[0], ClientEvent::ResponseCancel));
        assert!(is_lock(&sent[1]));
    }

    #[tokio::test]
    async fn short_hold_is_discarded_without_commit() {
        let (mut controller, wire) = ready().await;
        controller.start_capture().await.unwrap();
        assert_eq!(controller.status(), ConnectionStatus::Listening);

        let outcome = controller.stop_capture(Duration::from_millis(200)).await.unwrap();
        assert_eq!(outcome, CaptureOutcome::Discarded);
        assert_eq!(controller.status(), ConnectionStatus::Ready);
        assert!(!wire
            .sent()
            .iter()
            .any(|e| matches!(e, ClientEvent::InputAudioBufferCommit)));
    }

    #[tokio::test]
    async fn second_release_is_a_no_op() {
        let (mut controller, wire) = ready().await;
        controller.start_capture().await.unwrap();
        assert_eq!(
            controller.stop_capture(Duration::from_secs(1)).await.unwrap(),
            CaptureOutcome::Committed
        );
        assert_eq!(
            controller.stop_capture(Duration::from_secs(1)).await.unwrap(),
            CaptureOutcome::Ignored
        );
        let commits = wire
            .sent()
            .iter()
            .filter(|e| matches!(e, ClientEvent::InputAudioBufferCommit))
            .count();
        assert_eq!(commits, 1);
    }

    #[tokio::test]
    async fn capture_requires_ready() {
        let (mut controller, _wire) = ready().await;
        controller.speak("Hi", SpeechKind::Question).await.unwrap();
        assert!(matches!(
            controller.start_capture().await,
            Err(VoiceError::NotReady(ConnectionStatus::Speaking))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn capture_deadline_counts_down() {
        let (mut controller, _wire) = ready().await;
        assert!(controller.capture_deadline().is_none());
        controller.start_capture().await.unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(controller.capture_remaining(), Some(Duration::from_secs(6)));
        assert_eq!(controller.held_for(), Some(Duration::from_secs(4)));

        tokio::time::advance(Duration::from_secs(20)).await;
        assert_eq!(controller.capture_remaining(), Some(Duration::ZERO));
    }

    #[tokio::test]
    async fn benign_errors_are_ignored_and_fatal_ones_tear_down() {
        let (mut controller, wire) = ready().await;

        let benign = TransportEvent::TransportError {
            code: Some(CANCEL_NOT_ACTIVE.into()),
            message: "no active response".into(),
        };
        assert_eq!(controller.handle_event(benign).await, None);
        assert_eq!(controller.status(), ConnectionStatus::Ready);

        let fatal = TransportEvent::TransportError {
            code: Some("server_error".into()),
            message: "boom".into(),
        };
        assert_eq!(
            controller.handle_event(fatal).await,
            Some(ControllerNotice::Disconnected("boom".into()))
        );
        assert_eq!(controller.status(), ConnectionStatus::Idle);
        assert_eq!(wire.teardowns(), 1);
    }

    #[tokio::test]
    async fn empty_commit_returns_to_ready() {
        let (mut controller, _wire) = ready().await;
        controller.start_capture().await.unwrap();
        controller.stop_capture(Duration::from_secs(1)).await.unwrap();

        let notice = controller
            .handle_event(TransportEvent::TransportError {
                code: Some(COMMIT_EMPTY.into()),
                message: "buffer too small".into(),
            })
            .await;
        assert_eq!(notice, Some(ControllerNotice::NothingHeard));
        assert_eq!(controller.status(), ConnectionStatus::Ready);
        controller.start_capture().await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_drift_does_not_finish_scripted_speech() {
        let (mut controller, _wire) = ready().await;
        controller.handle_event(TransportEvent::SpeechTextDelta("Sure".into())).await;
        assert_eq!(controller.speech_state(), SpeechState::Drifting);

        controller.speak("Nice to meet you!", SpeechKind::Remark).await.unwrap();
        assert_eq!(controller.handle_event(done(Some("drift"), true)).await, None);
        assert_eq!(controller.status(), ConnectionStatus::Speaking);
        assert!(controller.is_intentional());

        assert_eq!(
            controller.handle_event(done(Some("remark"), false)).await,
            Some(ControllerNotice::SpeechFinished(SpeechKind::Remark))
        );
        assert_eq!(controller.status(), ConnectionStatus::Ready);
    }

    #[tokio::test]
    async fn only_the_scripted_response_id_finishes_speech() {
        let (mut controller, wire) = ready().await;

        // Unsolicited response: cancelled on sight and remembered.
        controller
            .handle_event(TransportEvent::ResponseStarted("drift".into()))
            .await;
        assert_eq!(controller.speech_state(), SpeechState::Drifting);
        assert!(wire
            .take_sent()
            .iter()
            .any(|e| matches!(e, ClientEvent::ResponseCancel)));

        controller.speak("What is your email?", SpeechKind::Question).await.unwrap();
        controller
            .handle_event(TransportEvent::ResponseStarted("scripted".into()))
            .await;

        // The drift finishes late and uncancelled: still not ours.
        assert_eq!(controller.handle_event(done(Some("drift"), false)).await, None);
        assert_eq!(controller.handle_event(done(Some("other"), false)).await, None);
        assert_eq!(controller.status(), ConnectionStatus::Speaking);

        assert_eq!(
            controller.handle_event(done(Some("scripted"), false)).await,
            Some(ControllerNotice::SpeechFinished(SpeechKind::Question))
        );
    }

    #[tokio::test]
    async fn failed_transcription_returns_to_ready() {
        let (mut controller, _wire) = ready().await;
        controller.start_capture().await.unwrap();
        controller.stop_capture(Duration::from_secs(1)).await.unwrap();
        assert_eq!(controller.status(), ConnectionStatus::Processing);

        let notice = controller
            .handle_event(TransportEvent::TranscriptionFailed("unintelligible".into()))
            .await;
        assert_eq!(notice, Some(ControllerNotice::NothingHeard));
        assert_eq!(controller.status(), ConnectionStatus::Ready);
        assert!(controller.processing_deadline().is_none());
        controller.start_capture().await.unwrap();
    }

    #[tokio::test]
    async fn failed_transcription_without_commit_is_ignored() {
        let (mut controller, _wire) = ready().await;
        let notice = controller
            .handle_event(TransportEvent::TranscriptionFailed("late".into()))
            .await;
        assert_eq!(notice, None);
        assert_eq!(controller.status(), ConnectionStatus::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn overdue_transcript_is_given_up() {
        let (mut controller, _wire) = ready().await;
        controller.start_capture().await.unwrap();
        controller.stop_capture(Duration::from_secs(1)).await.unwrap();
        let deadline = controller.processing_deadline().unwrap();
        assert_eq!(deadline, Instant::now() + Duration::from_secs(8));

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(controller.expire_processing(), None);
        assert_eq!(controller.status(), ConnectionStatus::Processing);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(controller.expire_processing(), Some(ControllerNotice::NothingHeard));
        assert_eq!(controller.status(), ConnectionStatus::Ready);
        assert!(controller.processing_deadline().is_none());
        controller.start_capture().await.unwrap();
    }
}
