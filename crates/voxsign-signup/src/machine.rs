//! The signup interview as a pure reducer.
//!
//! [`SignupMachine::apply`] takes one [`SignupEvent`] and returns the
//! [`SignupEffect`]s the driver must perform. The machine never touches the
//! transport, clocks or the network. Timers come back as scheduled events,
//! speech completion comes back as [`SignupEvent::SpeechFinished`], and
//! account creation comes back as [`SignupEvent::AccountCreated`] or
//! [`SignupEvent::AccountFailed`].

use crate::config::SignupConfig;
use crate::remarks::RemarkPicker;
use crate::script::{self, FIRST_QUESTION_INDEX, GREETING_INDEX, STEPS};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info};
use voxsign_form::{match_country, normalize_for_step, validate, ValidationContext, COUNTRIES};
use voxsign_types::{FormState, Locale, SessionPhase, SpeechKind, StepDefinition, StepId};

/// Inputs to the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupEvent {
    /// The speech session is connected and idle.
    TransportReady,
    /// The speech session dropped or failed to connect.
    TransportLost,
    /// A scripted utterance finished playing.
    SpeechFinished(SpeechKind),
    /// A scripted utterance could not be started.
    SpeechUnavailable(SpeechKind),
    /// The pause after a prompt elapsed.
    RevealInput { step_index: usize },
    /// "Let's Begin" was pressed.
    Begin,
    CaptureStarted,
    /// The capture ended without producing audio to transcribe.
    CaptureCancelled,
    /// The committed capture was empty.
    NothingHeard,
    /// A transcript for the capture committed while `step_index` was current.
    Transcript { text: String, step_index: usize },
    /// Typed answer for a non-voice step.
    Submit(String),
    Confirm,
    Edit,
    EditChanged(String),
    Retry,
    Skip,
    AcceptTerms(bool),
    AccountCreated { needs_email_confirmation: bool },
    AccountFailed { weak_password: bool },
    /// The welcome delay elapsed.
    Finish { needs_email_confirmation: bool },
}

/// Work the driver performs on the machine's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupEffect {
    Speak { text: String, kind: SpeechKind },
    Schedule { after: Duration, event: SignupEvent },
    CreateAccount(FormState),
    Complete { needs_email_confirmation: bool },
}

/// The scripted utterance the machine is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Awaiting {
    Nothing,
    Prompt(usize),
    Remark(usize),
    Welcome,
}

pub struct SignupMachine {
    locale: Locale,
    reveal_pause: Duration,
    welcome_delay: Duration,
    picker: Box<dyn RemarkPicker>,

    step_index: usize,
    phase: SessionPhase,
    form: FormState,
    captured: String,
    edit_value: String,
    error: Option<String>,
    terms_checked: bool,

    transport_ready: bool,
    awaiting: Awaiting,
    spoken: BTreeSet<usize>,
    input_revealed: bool,
    begin_revealed: bool,
    completed: Option<bool>,
}

impl SignupMachine {
    pub fn new(config: &SignupConfig, picker: Box<dyn RemarkPicker>) -> Self {
        Self {
            locale: config.locale,
            reveal_pause: config.reveal_pause(),
            welcome_delay: config.welcome_delay(),
            picker,
            step_index: GREETING_INDEX,
            phase: SessionPhase::Asking,
            form: FormState::default(),
            captured: String::new(),
            edit_value: String::new(),
            error: None,
            terms_checked: false,
            transport_ready: false,
            awaiting: Awaiting::Nothing,
            spoken: BTreeSet::new(),
            input_revealed: false,
            begin_revealed: false,
            completed: None,
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn step(&self) -> &'static StepDefinition {
        &STEPS[self.step_index]
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn captured(&self) -> &str {
        &self.captured
    }

    pub fn edit_value(&self) -> &str {
        &self.edit_value
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn terms_checked(&self) -> bool {
        self.terms_checked
    }

    pub fn input_revealed(&self) -> bool {
        self.input_revealed
    }

    pub fn begin_revealed(&self) -> bool {
        self.begin_revealed
    }

    pub fn is_speaking(&self) -> bool {
        self.awaiting != Awaiting::Nothing
    }

    pub fn completed(&self) -> Option<bool> {
        self.completed
    }

    /// Step indices whose prompt has been handed to the speech session.
    pub fn spoken_steps(&self) -> &BTreeSet<usize> {
        &self.spoken
    }

    /// Whether the capture control may be pressed right now.
    pub fn can_capture(&self) -> bool {
        self.step().voice
            && self.phase == SessionPhase::Asking
            && self.input_revealed
            && self.transport_ready
            && !self.is_speaking()
    }

    pub fn apply(&mut self, event: SignupEvent) -> Vec<SignupEffect> {
        debug!(step = %self.step().id, phase = ?self.phase, ?event, "signup event");
        let mut effects = Vec::new();
        match event {
            SignupEvent::TransportReady => {
                self.transport_ready = true;
                self.request_prompt(&mut effects);
            }
            SignupEvent::TransportLost => {
                self.transport_ready = false;
                if self.phase == SessionPhase::Listening {
                    self.phase = SessionPhase::Asking;
                }
                let pending = self.awaiting;
                self.speech_unavailable(pending, &mut effects);
            }
            SignupEvent::SpeechFinished(kind) => self.on_speech_finished(kind, &mut effects),
            SignupEvent::SpeechUnavailable(_) => {
                let pending = self.awaiting;
                self.speech_unavailable(pending, &mut effects);
            }
            SignupEvent::RevealInput { step_index } => {
                if step_index != self.step_index || self.is_speaking() {
                    debug!(step_index, current = self.step_index, "ignoring stale reveal");
                } else if step_index == GREETING_INDEX {
                    self.begin_revealed = true;
                } else {
                    self.input_revealed = true;
                }
            }
            SignupEvent::Begin => {
                if self.step_index == GREETING_INDEX && self.begin_revealed {
                    self.enter_step(FIRST_QUESTION_INDEX, &mut effects);
                }
            }
            SignupEvent::CaptureStarted => {
                if self.can_capture() {
                    self.phase = SessionPhase::Listening;
                    self.error = None;
                }
            }
            SignupEvent::CaptureCancelled => {
                if self.phase == SessionPhase::Listening {
                    self.phase = SessionPhase::Asking;
                }
            }
            SignupEvent::NothingHeard => {
                if self.phase == SessionPhase::Listening {
                    self.phase = SessionPhase::Asking;
                    self.error = Some(script::NOTHING_HEARD.get(self.locale).to_string());
                }
            }
            SignupEvent::Transcript { text, step_index } => self.on_transcript(&text, step_index),
            SignupEvent::Submit(value) => self.on_submit(&value, &mut effects),
            SignupEvent::Confirm => self.on_confirm(&mut effects),
            SignupEvent::Edit => {
                if self.phase == SessionPhase::Confirming && !self.is_speaking() {
                    self.phase = SessionPhase::Editing;
                }
            }
            SignupEvent::EditChanged(value) => {
                if self.phase == SessionPhase::Editing {
                    self.edit_value = value;
                }
            }
            SignupEvent::Retry => {
                if matches!(self.phase, SessionPhase::Confirming | SessionPhase::Editing)
                    && !self.is_speaking()
                {
                    self.phase = SessionPhase::Asking;
                    self.captured.clear();
                    self.edit_value.clear();
                    self.error = None;
                }
            }
            SignupEvent::Skip => {
                let step = self.step();
                if !step.required && self.phase == SessionPhase::Asking && !self.is_speaking() {
                    self.form.clear(step.id);
                    info!(step = %step.id, "step skipped");
                    self.enter_step(self.step_index + 1, &mut effects);
                }
            }
            SignupEvent::AcceptTerms(accepted) => {
                if self.step().id == StepId::Terms {
                    self.terms_checked = accepted;
                    if accepted {
                        self.error = None;
                    }
                }
            }
            SignupEvent::AccountCreated {
                needs_email_confirmation,
            } => self.on_account_created(needs_email_confirmation, &mut effects),
            SignupEvent::AccountFailed { weak_password } => {
                if self.step().id != StepId::Creating {
                    return effects;
                }
                self.form.clear(StepId::Password);
                self.form.clear(StepId::ConfirmPassword);
                self.enter_step(script::index_of(StepId::Password), &mut effects);
                let message = if weak_password {
                    script::WEAK_PASSWORD
                } else {
                    script::ACCOUNT_FAILED
                };
                self.error = Some(message.get(self.locale).to_string());
            }
            SignupEvent::Finish {
                needs_email_confirmation,
            } => self.finish(needs_email_confirmation, &mut effects),
        }
        effects
    }

    /// Moves to `index`, resetting per-step state and queuing its prompt.
    fn enter_step(&mut self, index: usize, effects: &mut Vec<SignupEffect>) {
        let index = index.min(STEPS.len() - 1);
        self.step_index = index;
        self.phase = SessionPhase::Asking;
        self.captured.clear();
        self.edit_value.clear();
        self.error = None;
        self.input_revealed = false;
        info!(step = %STEPS[index].id, index, "entering step");

        if STEPS[index].id == StepId::Creating {
            effects.push(SignupEffect::CreateAccount(self.form.clone()));
            return;
        }
        self.request_prompt(effects);
    }

    /// Speaks the current step's prompt once. Voice steps wait for the
    /// session; typed steps fall back to showing their input right away.
    fn request_prompt(&mut self, effects: &mut Vec<SignupEffect>) {
        let index = self.step_index;
        let Some(text) = script::prompt_text(index, self.locale) else {
            return;
        };
        if self.is_speaking() {
            return;
        }
        if self.spoken.contains(&index) {
            self.reveal_now();
            return;
        }
        if !self.transport_ready {
            if !self.step().voice && index != GREETING_INDEX {
                self.input_revealed = true;
            }
            return;
        }

        self.spoken.insert(index);
        self.awaiting = Awaiting::Prompt(index);
        let kind = if index == GREETING_INDEX {
            SpeechKind::Greeting
        } else {
            SpeechKind::Question
        };
        effects.push(SignupEffect::Speak {
            text: text.to_string(),
            kind,
        });
    }

    fn reveal_now(&mut self) {
        if self.step_index == GREETING_INDEX {
            self.begin_revealed = true;
        } else {
            self.input_revealed = true;
        }
    }

    fn on_speech_finished(&mut self, kind: SpeechKind, effects: &mut Vec<SignupEffect>) {
        let awaiting = std::mem::replace(&mut self.awaiting, Awaiting::Nothing);
        match awaiting {
            Awaiting::Prompt(index) if index == self.step_index => {
                effects.push(SignupEffect::Schedule {
                    after: self.reveal_pause,
                    event: SignupEvent::RevealInput { step_index: index },
                });
            }
            Awaiting::Remark(index) if index == self.step_index => {
                self.enter_step(index + 1, effects);
            }
            Awaiting::Nothing => {
                debug!(?kind, "speech finished with nothing pending");
            }
            other => {
                debug!(?kind, ?other, "speech finished for a step no longer current");
            }
        }
    }

    /// Keeps the flow moving when scripted speech cannot happen.
    fn speech_unavailable(&mut self, awaiting: Awaiting, effects: &mut Vec<SignupEffect>) {
        self.awaiting = Awaiting::Nothing;
        match awaiting {
            Awaiting::Prompt(index) => {
                if index == GREETING_INDEX {
                    self.begin_revealed = true;
                } else if STEPS[index].voice {
                    // Re-spoken once the session comes back.
                    self.spoken.remove(&index);
                } else {
                    self.input_revealed = true;
                }
            }
            Awaiting::Remark(index) if index == self.step_index => {
                self.enter_step(index + 1, effects);
            }
            Awaiting::Remark(_) | Awaiting::Welcome | Awaiting::Nothing => {}
        }
    }

    fn on_transcript(&mut self, text: &str, step_index: usize) {
        let step = self.step();
        if step_index != self.step_index
            || !step.voice
            || !self.input_revealed
            || !matches!(self.phase, SessionPhase::Asking | SessionPhase::Listening)
        {
            debug!(step_index, current = self.step_index, "ignoring stale transcript");
            return;
        }

        let mut value = normalize_for_step(step.id, text);
        if step.id == StepId::Country {
            if let Some(country) = match_country(&value, COUNTRIES) {
                value = country.display_name(self.locale).to_string();
            }
        }
        if value.is_empty() {
            self.phase = SessionPhase::Asking;
            self.error = Some(script::NOTHING_HEARD.get(self.locale).to_string());
            return;
        }

        self.captured = value.clone();
        self.edit_value = value;
        self.error = None;
        self.phase = SessionPhase::Confirming;
    }

    fn on_submit(&mut self, raw: &str, effects: &mut Vec<SignupEffect>) {
        let step = self.step();
        if step.voice
            || !step.takes_input()
            || !self.input_revealed
            || self.phase != SessionPhase::Asking
            || self.is_speaking()
        {
            return;
        }

        if step.id == StepId::Terms {
            let ctx = ValidationContext::from_form(&self.form).with_terms(self.terms_checked);
            if let Err(e) = validate(StepId::Terms, "", &ctx) {
                self.error = Some(e.message(self.locale));
                return;
            }
            self.form.agreed_to_terms = true;
            self.enter_step(self.step_index + 1, effects);
            return;
        }

        let value = normalize_for_step(step.id, raw);
        if let Err(e) = validate(step.id, &value, &ValidationContext::from_form(&self.form)) {
            debug!(step = %step.id, error = %e, "typed value rejected");
            self.error = Some(e.message(self.locale));
            return;
        }
        self.form.set(step.id, value);
        self.enter_step(self.step_index + 1, effects);
    }

    fn on_confirm(&mut self, effects: &mut Vec<SignupEffect>) {
        let step = self.step();
        if !matches!(self.phase, SessionPhase::Confirming | SessionPhase::Editing)
            || self.is_speaking()
        {
            return;
        }

        let value = normalize_for_step(step.id, &self.edit_value);
        if let Err(e) = validate(step.id, &value, &ValidationContext::from_form(&self.form)) {
            debug!(step = %step.id, error = %e, "confirmed value rejected");
            self.error = Some(e.message(self.locale));
            return;
        }

        if step.id == StepId::Country {
            match match_country(&value, COUNTRIES) {
                Some(country) => self.form.set_country(country, self.locale),
                None => {
                    self.form.clear(StepId::Country);
                    self.form.country = value.clone();
                }
            }
        } else {
            self.form.set(step.id, value.clone());
        }
        self.captured = value.clone();
        self.edit_value = value;
        self.error = None;
        self.phase = SessionPhase::Confirming;

        let remarks = script::remarks(step.id);
        if !step.voice || remarks.is_empty() || !self.transport_ready {
            self.enter_step(self.step_index + 1, effects);
            return;
        }
        let remark = remarks[self.picker.pick(remarks.len()).min(remarks.len() - 1)];
        self.awaiting = Awaiting::Remark(self.step_index);
        effects.push(SignupEffect::Speak {
            text: remark.get(self.locale).to_string(),
            kind: SpeechKind::Remark,
        });
    }

    fn on_account_created(&mut self, needs_email_confirmation: bool, effects: &mut Vec<SignupEffect>) {
        if self.step().id != StepId::Creating {
            return;
        }
        self.step_index = script::index_of(StepId::Welcome);
        self.phase = SessionPhase::Asking;
        info!(needs_email_confirmation, "account created, welcoming user");

        if !self.transport_ready {
            self.finish(needs_email_confirmation, effects);
            return;
        }
        self.awaiting = Awaiting::Welcome;
        effects.push(SignupEffect::Speak {
            text: script::WELCOME.get(self.locale).to_string(),
            kind: SpeechKind::Remark,
        });
        effects.push(SignupEffect::Schedule {
            after: self.welcome_delay,
            event: SignupEvent::Finish {
                needs_email_confirmation,
            },
        });
    }

    fn finish(&mut self, needs_email_confirmation: bool, effects: &mut Vec<SignupEffect>) {
        if self.step().id != StepId::Welcome || self.completed.is_some() {
            return;
        }
        self.completed = Some(needs_email_confirmation);
        effects.push(SignupEffect::Complete {
            needs_email_confirmation,
        });
    }
}
