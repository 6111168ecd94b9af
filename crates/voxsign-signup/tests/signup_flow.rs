use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use voxsign_signup::{
    AccountCreated, AccountCreator, AccountError, FixedPicker, SignupConfig, SignupError,
    SignupHandle, SignupOutcome, SignupSession, SignupSnapshot, UiCommand,
};
use voxsign_types::{ConnectionStatus, FormState, Locale, SessionPhase, StepId};
use voxsign_voice::testing::{RecordingTransport, TransportLog};
use voxsign_voice::{ClientEvent, RealtimeConfig, TransportEvent, TurnController};

const LOCK_MARKER: &str = "silent transcription relay";
/// Queued answer the fake model fails to transcribe.
const UNINTELLIGIBLE: &str = "<unintelligible>";

#[derive(Clone)]
struct FakeAccounts {
    responses: Arc<Mutex<VecDeque<Result<AccountCreated, AccountError>>>>,
    calls: Arc<Mutex<Vec<FormState>>>,
}

impl FakeAccounts {
    fn new(responses: Vec<Result<AccountCreated, AccountError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl AccountCreator for FakeAccounts {
    async fn create_account(&self, form: &FormState) -> Result<AccountCreated, AccountError> {
        self.calls.lock().unwrap().push(form.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(AccountCreated::default()))
    }
}

/// Plays the remote model: finishes every requested response and transcribes
/// every committed capture with the next queued answer. Once the answers run
/// out, commits go unanswered. Records where in the outbound log each
/// transcript or completion was emitted.
fn spawn_fake_model(wire: TransportLog, answers: Vec<&'static str>) -> (JoinHandle<()>, Arc<Mutex<Vec<usize>>>) {
    let marks = Arc::new(Mutex::new(Vec::new()));
    let recorded = marks.clone();
    let task = tokio::spawn(async move {
        let mut answers = answers.into_iter();
        let mut cursor = 0;
        loop {
            sleep(Duration::from_millis(5)).await;
            let sent = wire.sent();
            for event in &sent[cursor..] {
                match event {
                    ClientEvent::ResponseCreate { .. } => {
                        let id = format!("resp_{}", sent.len());
                        wire.emit(TransportEvent::ResponseStarted(id.clone()));
                        wire.emit(TransportEvent::SpeechTextDelta("...".into()));
                        recorded.lock().unwrap().push(sent.len());
                        wire.emit(TransportEvent::SpeechCompleted {
                            response_id: Some(id),
                            cancelled: false,
                        });
                    }
                    ClientEvent::InputAudioBufferCommit => match answers.next() {
                        Some(UNINTELLIGIBLE) => {
                            wire.emit(TransportEvent::TranscriptionFailed("unintelligible".into()));
                        }
                        Some(answer) => {
                            recorded.lock().unwrap().push(sent.len());
                            wire.emit(TransportEvent::TranscriptCompleted(answer.into()));
                        }
                        None => {}
                    },
                    _ => {}
                }
            }
            cursor = sent.len();
        }
    });
    (task, marks)
}

fn start(
    locale: Locale,
    accounts: FakeAccounts,
) -> (
    JoinHandle<Result<SignupOutcome, SignupError>>,
    SignupHandle,
    TransportLog,
) {
    let (transport, wire) = RecordingTransport::new();
    let controller = TurnController::new(transport, RealtimeConfig::default(), locale);
    let config = SignupConfig::for_locale(locale);
    let (session, handle) = SignupSession::new(controller, accounts, &config, Box::new(FixedPicker(1)));
    (tokio::spawn(session.run()), handle, wire)
}

async fn wait_for(
    rx: &mut watch::Receiver<SignupSnapshot>,
    what: &str,
    pred: impl FnMut(&SignupSnapshot) -> bool,
) -> SignupSnapshot {
    let snapshot = tokio::time::timeout(Duration::from_secs(120), rx.wait_for(pred))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {what}"))
        .unwrap_or_else(|_| panic!("session stopped while waiting for {what}"));
    snapshot.clone()
}

/// Holds the capture control for `hold` on the current voice step and waits
/// for the confirmation card.
async fn speak_answer(handle: &SignupHandle, rx: &mut watch::Receiver<SignupSnapshot>, step: StepId) -> SignupSnapshot {
    wait_for(rx, "capture to open", |s| s.step == step && s.can_capture).await;
    assert!(handle.send(UiCommand::HoldStart).await);
    wait_for(rx, "listening", |s| s.status == ConnectionStatus::Listening).await;
    sleep(Duration::from_secs(1)).await;
    assert!(handle.send(UiCommand::HoldEnd).await);
    wait_for(rx, "confirmation", |s| s.step == step && s.phase == SessionPhase::Confirming).await
}

async fn type_answer(handle: &SignupHandle, rx: &mut watch::Receiver<SignupSnapshot>, step: StepId, value: &str) {
    wait_for(rx, "typed input", |s| s.step == step && s.input_revealed).await;
    assert!(handle.send(UiCommand::Submit(value.to_string())).await);
}

#[tokio::test(start_paused = true)]
async fn full_interview_creates_account_and_welcomes() {
    let accounts = FakeAccounts::new(vec![Ok(AccountCreated {
        needs_email_confirmation: true,
    })]);
    let (session, handle, wire) = start(Locale::En, accounts.clone());
    let (model, marks) = spawn_fake_model(
        wire.clone(),
        vec![
            "my name is john smith",
            "my username should be John Doe!",
            "john dot doe at example dot com",
            "I'm from Saudi Arabia",
            "Riyadh.",
        ],
    );
    let mut rx = handle.subscribe();

    wait_for(&mut rx, "begin", |s| s.begin_revealed).await;
    handle.send(UiCommand::Begin).await;

    let name = speak_answer(&handle, &mut rx, StepId::Name).await;
    assert_eq!(name.captured, "John Smith");
    handle.send(UiCommand::Confirm).await;

    let username = speak_answer(&handle, &mut rx, StepId::Username).await;
    assert_eq!(username.captured, "john_doe");
    handle.send(UiCommand::Confirm).await;

    let email = speak_answer(&handle, &mut rx, StepId::Email).await;
    assert_eq!(email.captured, "john.doe@example.com");
    handle.send(UiCommand::Confirm).await;

    type_answer(&handle, &mut rx, StepId::Password, "correct horse").await;
    type_answer(&handle, &mut rx, StepId::ConfirmPassword, "correct horse").await;

    let dob = wait_for(&mut rx, "dob", |s| s.step == StepId::Dob && s.input_revealed).await;
    handle.send(UiCommand::Skip).await;
    let country = wait_for(&mut rx, "country", |s| s.step == StepId::Country).await;
    assert_eq!(country.step_index, dob.step_index + 1);
    assert_eq!(country.form.date_of_birth, "");

    speak_answer(&handle, &mut rx, StepId::Country).await;
    handle.send(UiCommand::Confirm).await;
    let city = speak_answer(&handle, &mut rx, StepId::City).await;
    assert_eq!(city.captured, "Riyadh");
    handle.send(UiCommand::Confirm).await;

    wait_for(&mut rx, "terms", |s| s.step == StepId::Terms && s.input_revealed).await;
    handle.send(UiCommand::Submit(String::new())).await;
    let refused = wait_for(&mut rx, "terms error", |s| s.error.is_some()).await;
    assert_eq!(refused.step, StepId::Terms);
    handle.send(UiCommand::AcceptTerms(true)).await;
    handle.send(UiCommand::Submit(String::new())).await;

    let outcome = session.await.unwrap().unwrap();
    model.abort();

    assert!(outcome.needs_email_confirmation);
    let form = outcome.form;
    assert_eq!(form.name, "John Smith");
    assert_eq!(form.username, "john_doe");
    assert_eq!(form.email, "john.doe@example.com");
    assert_eq!(form.password, "correct horse");
    assert_eq!(form.confirm_password, "correct horse");
    assert_eq!(form.country, "Saudi Arabia");
    assert_eq!(form.country_code, "SA");
    assert_eq!(form.city, "Riyadh");
    assert!(form.agreed_to_terms);
    assert_eq!(accounts.calls.lock().unwrap().len(), 1);

    let sent = wire.sent();
    let welcome_spoken = sent.iter().any(|e| {
        matches!(e, ClientEvent::SessionUpdate { session } if session.instructions.contains("Welcome aboard"))
    });
    assert!(welcome_spoken);

    // Every remark spoken for the voice steps is a non-empty scripted line.
    let scripted: Vec<&str> = sent
        .iter()
        .filter_map(|e| match e {
            ClientEvent::SessionUpdate { session } if !session.instructions.contains(LOCK_MARKER) => {
                Some(session.instructions.as_str())
            }
            _ => None,
        })
        .collect();
    for remark in ["What a lovely name.", "That username works.", "Perfect.", "Thanks for sharing.", "Thank you."] {
        assert!(
            scripted.iter().any(|s| s.contains(&format!("\"{remark}\""))),
            "missing remark {remark}"
        );
    }

    // The first instruction after each transcript or completed utterance
    // re-locks the session.
    for mark in marks.lock().unwrap().iter() {
        let next_update = sent[*mark..]
            .iter()
            .find(|e| matches!(e, ClientEvent::SessionUpdate { .. }));
        if let Some(ClientEvent::SessionUpdate { session }) = next_update {
            assert!(session.instructions.contains(LOCK_MARKER), "unlocked after event at {mark}");
        }
    }

    assert_eq!(wire.teardown_calls(), 1);
    assert_eq!(wire.teardowns(), 1);
}

#[tokio::test(start_paused = true)]
async fn short_hold_never_commits() {
    let (session, handle, wire) = start(Locale::En, FakeAccounts::new(vec![]));
    let (model, _) = spawn_fake_model(wire.clone(), vec![]);
    let mut rx = handle.subscribe();

    wait_for(&mut rx, "begin", |s| s.begin_revealed).await;
    handle.send(UiCommand::Begin).await;
    wait_for(&mut rx, "capture", |s| s.step == StepId::Name && s.can_capture).await;

    handle.send(UiCommand::HoldStart).await;
    wait_for(&mut rx, "listening", |s| s.status == ConnectionStatus::Listening).await;
    sleep(Duration::from_millis(200)).await;
    handle.send(UiCommand::HoldEnd).await;
    let after = wait_for(&mut rx, "ready", |s| s.status == ConnectionStatus::Ready).await;

    assert_eq!(after.phase, SessionPhase::Asking);
    assert!(!wire
        .sent()
        .iter()
        .any(|e| matches!(e, ClientEvent::InputAudioBufferCommit)));

    handle.send(UiCommand::Close).await;
    assert!(matches!(session.await.unwrap(), Err(SignupError::Cancelled)));
    model.abort();
    assert_eq!(wire.teardown_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn runaway_capture_stops_at_the_deadline() {
    let (session, handle, wire) = start(Locale::Ar, FakeAccounts::new(vec![]));
    let (model, _) = spawn_fake_model(wire.clone(), vec!["اسمي علي"]);
    let mut rx = handle.subscribe();

    wait_for(&mut rx, "begin", |s| s.begin_revealed).await;
    handle.send(UiCommand::Begin).await;
    wait_for(&mut rx, "capture", |s| s.step == StepId::Name && s.can_capture).await;
    handle.send(UiCommand::HoldStart).await;

    // Never released: the ten second limit commits on its own.
    let confirming = wait_for(&mut rx, "auto commit", |s| s.phase == SessionPhase::Confirming).await;
    assert_eq!(confirming.captured, "علي");

    handle.send(UiCommand::HoldEnd).await;
    handle.send(UiCommand::Close).await;
    session.await.unwrap().unwrap_err();
    model.abort();

    let commits = wire
        .sent()
        .iter()
        .filter(|e| matches!(e, ClientEvent::InputAudioBufferCommit))
        .count();
    assert_eq!(commits, 1);
}

#[tokio::test(start_paused = true)]
async fn weak_password_rejection_returns_to_password() {
    let accounts = FakeAccounts::new(vec![Err(AccountError::WeakPassword("too common".into()))]);
    let (session, handle, wire) = start(Locale::En, accounts.clone());
    let (model, _) = spawn_fake_model(wire.clone(), vec!["jane", "jane_doe", "jane@example.com"]);
    let mut rx = handle.subscribe();

    wait_for(&mut rx, "begin", |s| s.begin_revealed).await;
    handle.send(UiCommand::Begin).await;
    for step in [StepId::Name, StepId::Username, StepId::Email] {
        speak_answer(&handle, &mut rx, step).await;
        handle.send(UiCommand::Confirm).await;
    }
    type_answer(&handle, &mut rx, StepId::Password, "password1").await;
    type_answer(&handle, &mut rx, StepId::ConfirmPassword, "password1").await;
    for step in [StepId::Dob, StepId::Country, StepId::City] {
        wait_for(&mut rx, "optional step", |s| s.step == step && (s.input_revealed || s.can_capture)).await;
        handle.send(UiCommand::Skip).await;
    }
    wait_for(&mut rx, "terms", |s| s.step == StepId::Terms && s.input_revealed).await;
    handle.send(UiCommand::AcceptTerms(true)).await;
    handle.send(UiCommand::Submit(String::new())).await;

    let back = wait_for(&mut rx, "password again", |s| s.step == StepId::Password && s.error.is_some()).await;
    assert_eq!(back.error.as_deref(), Some("That password is too weak. Please choose a stronger one."));
    assert!(back.input_revealed);
    assert_eq!(back.form.password, "");
    assert_eq!(back.form.confirm_password, "");
    assert_eq!(back.form.email, "jane@example.com");

    handle.send(UiCommand::Close).await;
    assert!(matches!(session.await.unwrap(), Err(SignupError::Cancelled)));
    model.abort();
}

#[tokio::test(start_paused = true)]
async fn transport_failure_is_recoverable() {
    let (transport, wire) = RecordingTransport::new();
    wire.fail_next_connect("permission denied");
    let controller = TurnController::new(transport, RealtimeConfig::default(), Locale::En);
    let (session, handle) = SignupSession::new(
        controller,
        FakeAccounts::new(vec![]),
        &SignupConfig::default(),
        Box::new(FixedPicker(0)),
    );
    let session = tokio::spawn(session.run());
    let (model, _) = spawn_fake_model(wire.clone(), vec![]);
    let mut rx = handle.subscribe();

    let failed = wait_for(&mut rx, "connection error", |s| s.connection_error.is_some()).await;
    assert_eq!(failed.status, ConnectionStatus::Idle);
    assert!(!failed.begin_revealed);

    handle.send(UiCommand::Reconnect).await;
    wait_for(&mut rx, "begin after reconnect", |s| s.begin_revealed && s.connection_error.is_none()).await;
    handle.send(UiCommand::Begin).await;
    wait_for(&mut rx, "name", |s| s.step == StepId::Name && s.can_capture).await;

    wire.emit(TransportEvent::TransportError {
        code: Some("server_error".into()),
        message: "session expired".into(),
    });
    let dropped = wait_for(&mut rx, "drop", |s| s.status == ConnectionStatus::Idle).await;
    assert_eq!(dropped.connection_error.as_deref(), Some("session expired"));
    assert!(!dropped.can_capture);

    handle.send(UiCommand::Reconnect).await;
    wait_for(&mut rx, "name again", |s| s.step == StepId::Name && s.can_capture).await;

    drop(handle);
    assert!(matches!(session.await.unwrap(), Err(SignupError::Cancelled)));
    model.abort();
    assert_eq!(wire.connects(), 3);
    assert_eq!(wire.teardowns(), 2);
}

/// Holds the capture control long enough to commit, without waiting for a
/// transcript.
async fn commit_capture(handle: &SignupHandle, rx: &mut watch::Receiver<SignupSnapshot>, step: StepId) {
    wait_for(rx, "capture to open", |s| s.step == step && s.can_capture).await;
    assert!(handle.send(UiCommand::HoldStart).await);
    wait_for(rx, "listening", |s| s.status == ConnectionStatus::Listening).await;
    sleep(Duration::from_secs(1)).await;
    assert!(handle.send(UiCommand::HoldEnd).await);
    wait_for(rx, "processing", |s| s.status == ConnectionStatus::Processing).await;
}

#[tokio::test(start_paused = true)]
async fn failed_transcription_lets_the_user_try_again() {
    let (session, handle, wire) = start(Locale::En, FakeAccounts::new(vec![]));
    let (model, _) = spawn_fake_model(wire.clone(), vec![UNINTELLIGIBLE, "my name is sara"]);
    let mut rx = handle.subscribe();

    wait_for(&mut rx, "begin", |s| s.begin_revealed).await;
    handle.send(UiCommand::Begin).await;

    commit_capture(&handle, &mut rx, StepId::Name).await;
    let retry = wait_for(&mut rx, "capture reopened", |s| s.step == StepId::Name && s.can_capture).await;
    assert_eq!(retry.phase, SessionPhase::Asking);
    assert_eq!(retry.status, ConnectionStatus::Ready);
    assert!(retry.error.is_some());

    let name = speak_answer(&handle, &mut rx, StepId::Name).await;
    assert_eq!(name.captured, "Sara");

    handle.send(UiCommand::Close).await;
    assert!(matches!(session.await.unwrap(), Err(SignupError::Cancelled)));
    model.abort();
}

#[tokio::test(start_paused = true)]
async fn unanswered_capture_times_out_back_to_ready() {
    let (session, handle, wire) = start(Locale::En, FakeAccounts::new(vec![]));
    let (model, _) = spawn_fake_model(wire.clone(), vec![]);
    let mut rx = handle.subscribe();

    wait_for(&mut rx, "begin", |s| s.begin_revealed).await;
    handle.send(UiCommand::Begin).await;

    commit_capture(&handle, &mut rx, StepId::Name).await;
    let committed_at = tokio::time::Instant::now();
    let retry = wait_for(&mut rx, "capture reopened", |s| s.step == StepId::Name && s.can_capture).await;
    assert!(committed_at.elapsed() >= Duration::from_secs(7));
    assert_eq!(retry.status, ConnectionStatus::Ready);
    assert!(retry.error.is_some());

    handle.send(UiCommand::HoldStart).await;
    wait_for(&mut rx, "listening again", |s| s.status == ConnectionStatus::Listening).await;

    handle.send(UiCommand::Close).await;
    assert!(matches!(session.await.unwrap(), Err(SignupError::Cancelled)));
    model.abort();
}
