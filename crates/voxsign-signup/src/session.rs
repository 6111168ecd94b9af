//! Async driver that connects the reducer to the speech session.
//!
//! One task owns everything mutable: the [`TurnController`], the
//! [`SignupMachine`] and the capture bookkeeping. It reacts to UI commands,
//! transport events, timers it scheduled for itself and the capture
//! deadline, and publishes a [`SignupSnapshot`] after every step.

use crate::account::{AccountCreator, HttpAccountCreator};
use crate::config::SignupConfig;
use crate::error::SignupError;
use crate::machine::{SignupEffect, SignupEvent, SignupMachine};
use crate::remarks::{RandomPicker, RemarkPicker};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, sleep_until};
use tracing::{debug, info, warn};
use voxsign_types::{ConnectionStatus, FormState, SessionPhase, StepId};
use voxsign_voice::{
    CaptureOutcome, ControllerNotice, MediaBackend, RealtimeTransport, SessionTransport,
    SignalingClient, TransportEvent, TurnController,
};

const COMMAND_BUFFER: usize = 32;

/// User actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    Begin,
    /// The capture control was pressed.
    HoldStart,
    /// The capture control was released.
    HoldEnd,
    Submit(String),
    Confirm,
    Edit,
    EditChanged(String),
    Retry,
    Skip,
    AcceptTerms(bool),
    /// Try the speech session again after a failure.
    Reconnect,
    /// A user gesture that may unblock remote audio playback.
    UnlockAudio,
    Close,
}

/// Everything the UI renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupSnapshot {
    pub step_index: usize,
    pub step: StepId,
    pub phase: SessionPhase,
    pub status: ConnectionStatus,
    pub begin_revealed: bool,
    pub input_revealed: bool,
    pub can_capture: bool,
    pub captured: String,
    pub edit_value: String,
    pub terms_checked: bool,
    pub error: Option<String>,
    pub connection_error: Option<String>,
    /// Text of the utterance currently being spoken.
    pub caption: String,
    pub playback_blocked: bool,
    pub capture_remaining_ms: Option<u64>,
    pub completed: bool,
    #[serde(skip)]
    pub form: FormState,
}

/// How a finished interview ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupOutcome {
    pub form: FormState,
    pub needs_email_confirmation: bool,
}

/// UI-side handle: send commands, watch snapshots.
#[derive(Debug, Clone)]
pub struct SignupHandle {
    commands: mpsc::Sender<UiCommand>,
    snapshots: watch::Receiver<SignupSnapshot>,
}

impl SignupHandle {
    /// Returns `false` once the session has stopped.
    pub async fn send(&self, command: UiCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    pub fn snapshot(&self) -> SignupSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SignupSnapshot> {
        self.snapshots.clone()
    }
}

pub struct SignupSession<T: SessionTransport, A: AccountCreator + 'static> {
    controller: TurnController<T>,
    machine: SignupMachine,
    accounts: Arc<A>,
    commands: Option<mpsc::Receiver<UiCommand>>,
    snapshots: watch::Sender<SignupSnapshot>,
    internal_tx: mpsc::UnboundedSender<SignupEvent>,
    internal_rx: Option<mpsc::UnboundedReceiver<SignupEvent>>,
    /// Step that was current when the in-flight capture was committed.
    captured_step: Option<usize>,
    caption: String,
    playback_blocked: bool,
    connection_error: Option<String>,
    outcome: Option<bool>,
}

impl<T, A> SignupSession<T, A>
where
    T: SessionTransport,
    A: AccountCreator + 'static,
{
    pub fn new(
        controller: TurnController<T>,
        accounts: A,
        config: &SignupConfig,
        picker: Box<dyn RemarkPicker>,
    ) -> (Self, SignupHandle) {
        let machine = SignupMachine::new(config, picker);
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let initial = snapshot_of(&machine, &controller, None, "", false, false);
        let (snapshots_tx, snapshots_rx) = watch::channel(initial);

        let session = Self {
            controller,
            machine,
            accounts: Arc::new(accounts),
            commands: Some(commands_rx),
            snapshots: snapshots_tx,
            internal_tx,
            internal_rx: Some(internal_rx),
            captured_step: None,
            caption: String::new(),
            playback_blocked: false,
            connection_error: None,
            outcome: None,
        };
        let handle = SignupHandle {
            commands: commands_tx,
            snapshots: snapshots_rx,
        };
        (session, handle)
    }

    /// Runs the interview until it completes or the UI closes it. The
    /// speech session is torn down on every exit. If this future is dropped
    /// or its task aborted instead, the transport's own `Drop` releases the
    /// media; send [`UiCommand::Close`] for an orderly shutdown.
    pub async fn run(mut self) -> Result<SignupOutcome, SignupError> {
        let result = self.drive().await;
        self.controller.teardown().await;
        self.publish();
        match &result {
            Ok(outcome) => info!(
                needs_email_confirmation = outcome.needs_email_confirmation,
                "signup completed"
            ),
            Err(e) => info!(reason = %e, "signup stopped"),
        }
        result
    }

    async fn drive(&mut self) -> Result<SignupOutcome, SignupError> {
        let mut commands = self.commands.take().ok_or(SignupError::Cancelled)?;
        let mut internal = self.internal_rx.take().ok_or(SignupError::Cancelled)?;
        let mut events = self
            .controller
            .take_events()
            .ok_or(SignupError::EventStreamTaken)?;

        self.publish();
        self.connect().await;
        self.publish();

        loop {
            if let Some(needs_email_confirmation) = self.outcome {
                return Ok(SignupOutcome {
                    form: self.machine.form().clone(),
                    needs_email_confirmation,
                });
            }

            let deadline = self.controller.capture_deadline();
            let processing = self.controller.processing_deadline();
            tokio::select! {
                command = commands.recv() => match command {
                    None | Some(UiCommand::Close) => return Err(SignupError::Cancelled),
                    Some(command) => self.on_command(command).await,
                },
                Some(event) = events.recv() => self.on_transport_event(event).await,
                Some(event) = internal.recv() => self.dispatch(event).await,
                _ = sleep_until(deadline.unwrap_or_else(tokio::time::Instant::now)), if deadline.is_some() => {
                    debug!("capture reached its maximum duration");
                    self.end_capture().await;
                }
                _ = sleep_until(processing.unwrap_or_else(tokio::time::Instant::now)), if processing.is_some() => {
                    if let Some(notice) = self.controller.expire_processing() {
                        self.on_notice(notice).await;
                    }
                }
            }
            self.publish();
        }
    }

    async fn connect(&mut self) {
        match self.controller.connect().await {
            Ok(()) => {
                self.connection_error = None;
                self.dispatch(SignupEvent::TransportReady).await;
            }
            Err(e) => {
                warn!(error = %e, "speech session unavailable");
                self.connection_error = Some(e.to_string());
                self.dispatch(SignupEvent::TransportLost).await;
            }
        }
    }

    async fn on_command(&mut self, command: UiCommand) {
        match command {
            UiCommand::Begin => self.dispatch(SignupEvent::Begin).await,
            UiCommand::HoldStart => {
                if !self.machine.can_capture() {
                    debug!("capture pressed while not accepting input");
                    return;
                }
                match self.controller.start_capture().await {
                    Ok(()) => self.dispatch(SignupEvent::CaptureStarted).await,
                    Err(e) => debug!(error = %e, "capture not started"),
                }
            }
            UiCommand::HoldEnd => self.end_capture().await,
            UiCommand::Submit(value) => self.dispatch(SignupEvent::Submit(value)).await,
            UiCommand::Confirm => self.dispatch(SignupEvent::Confirm).await,
            UiCommand::Edit => self.dispatch(SignupEvent::Edit).await,
            UiCommand::EditChanged(value) => self.dispatch(SignupEvent::EditChanged(value)).await,
            UiCommand::Retry => self.dispatch(SignupEvent::Retry).await,
            UiCommand::Skip => self.dispatch(SignupEvent::Skip).await,
            UiCommand::AcceptTerms(accepted) => {
                self.dispatch(SignupEvent::AcceptTerms(accepted)).await
            }
            UiCommand::Reconnect => {
                if self.controller.status() == ConnectionStatus::Idle {
                    self.connect().await;
                }
            }
            UiCommand::UnlockAudio => match self.controller.unlock_playback().await {
                Ok(()) => self.playback_blocked = false,
                Err(e) => debug!(error = %e, "audio still blocked"),
            },
            // Handled by the loop.
            UiCommand::Close => {}
        }
    }

    async fn end_capture(&mut self) {
        let Some(hold) = self.controller.held_for() else {
            return;
        };
        let step_index = self.machine.step_index();
        match self.controller.stop_capture(hold).await {
            Ok(CaptureOutcome::Committed) => self.captured_step = Some(step_index),
            Ok(CaptureOutcome::Discarded) => self.dispatch(SignupEvent::CaptureCancelled).await,
            Ok(CaptureOutcome::Ignored) => {}
            Err(e) => {
                warn!(error = %e, "failed to end capture");
                self.dispatch(SignupEvent::CaptureCancelled).await;
            }
        }
    }

    async fn on_transport_event(&mut self, event: TransportEvent) {
        if let Some(notice) = self.controller.handle_event(event).await {
            self.on_notice(notice).await;
        }
    }

    async fn on_notice(&mut self, notice: ControllerNotice) {
        match notice {
            ControllerNotice::Transcript(text) => match self.captured_step.take() {
                Some(step_index) => {
                    self.dispatch(SignupEvent::Transcript { text, step_index })
                        .await
                }
                None => debug!("transcript without a committed capture"),
            },
            ControllerNotice::SpeechText(delta) => self.caption.push_str(&delta),
            ControllerNotice::SpeechFinished(kind) => {
                self.dispatch(SignupEvent::SpeechFinished(kind)).await
            }
            ControllerNotice::NothingHeard => {
                self.captured_step = None;
                self.dispatch(SignupEvent::NothingHeard).await;
            }
            ControllerNotice::PlaybackBlocked => self.playback_blocked = true,
            ControllerNotice::Disconnected(message) => {
                self.captured_step = None;
                self.connection_error = Some(message);
                self.dispatch(SignupEvent::TransportLost).await;
            }
        }
    }

    /// Feeds `event` to the machine and performs the resulting effects.
    /// Follow-up events produced here are handled before returning.
    async fn dispatch(&mut self, event: SignupEvent) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            for effect in self.machine.apply(event) {
                match effect {
                    SignupEffect::Speak { text, kind } => {
                        self.caption.clear();
                        if let Err(e) = self.controller.speak(&text, kind).await {
                            warn!(?kind, error = %e, "scripted speech unavailable");
                            queue.push_back(SignupEvent::SpeechUnavailable(kind));
                        }
                    }
                    SignupEffect::Schedule { after, event } => self.schedule(after, event),
                    SignupEffect::CreateAccount(form) => self.create_account(form),
                    SignupEffect::Complete {
                        needs_email_confirmation,
                    } => self.outcome = Some(needs_email_confirmation),
                }
            }
        }
    }

    fn schedule(&self, after: Duration, event: SignupEvent) {
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            sleep(after).await;
            let _ = tx.send(event);
        });
    }

    fn create_account(&self, form: FormState) {
        let accounts = self.accounts.clone();
        let tx = self.internal_tx.clone();
        info!(username = %form.username, "creating account");
        tokio::spawn(async move {
            let event = match accounts.create_account(&form).await {
                Ok(created) => SignupEvent::AccountCreated {
                    needs_email_confirmation: created.needs_email_confirmation,
                },
                Err(e) => {
                    warn!(error = %e, "account creation failed");
                    SignupEvent::AccountFailed {
                        weak_password: e.is_weak_password(),
                    }
                }
            };
            let _ = tx.send(event);
        });
    }

    fn publish(&self) {
        let snapshot = snapshot_of(
            &self.machine,
            &self.controller,
            self.connection_error.clone(),
            &self.caption,
            self.playback_blocked,
            self.outcome.is_some(),
        );
        self.snapshots.send_replace(snapshot);
    }
}

fn snapshot_of<T: SessionTransport>(
    machine: &SignupMachine,
    controller: &TurnController<T>,
    connection_error: Option<String>,
    caption: &str,
    playback_blocked: bool,
    completed: bool,
) -> SignupSnapshot {
    SignupSnapshot {
        step_index: machine.step_index(),
        step: machine.step().id,
        phase: machine.phase(),
        status: controller.status(),
        begin_revealed: machine.begin_revealed(),
        input_revealed: machine.input_revealed(),
        can_capture: machine.can_capture() && controller.status() == ConnectionStatus::Ready,
        captured: machine.captured().to_string(),
        edit_value: machine.edit_value().to_string(),
        terms_checked: machine.terms_checked(),
        error: machine.error().map(str::to_string),
        connection_error,
        caption: caption.to_string(),
        playback_blocked,
        capture_remaining_ms: controller
            .capture_remaining()
            .map(|remaining| remaining.as_millis() as u64),
        completed,
        form: machine.form().clone(),
    }
}

/// Builds a session over the realtime transport and the HTTP account
/// endpoint, with random remarks.
pub fn realtime_session<M: MediaBackend + 'static>(
    media: M,
    config: &SignupConfig,
    account_url: &str,
) -> Result<
    (
        SignupSession<RealtimeTransport<M>, HttpAccountCreator>,
        SignupHandle,
    ),
    SignupError,
> {
    let timeout = config.realtime.signaling_timeout();
    let signaling = SignalingClient::new(config.realtime.signaling_url.clone(), timeout)?;
    let transport = RealtimeTransport::new(media, signaling, config.locale);
    let controller = TurnController::new(transport, config.realtime.clone(), config.locale);
    let accounts = HttpAccountCreator::new(account_url, timeout)?;
    Ok(SignupSession::new(
        controller,
        accounts,
        config,
        Box::new(RandomPicker),
    ))
}
