//! Shared types and constants for the voxsign workspace.
//!
//! This crate provides the foundational types used across all voxsign
//! crates: the two supported locales, the ordered signup step identifiers,
//! the per-step and transport-level state enums, and the form state that
//! the signup orchestrator fills in.
//!
//! No crate in the workspace depends on anything *except* `voxsign-types`
//! for cross-cutting type definitions. This keeps the dependency graph clean
//! and prevents circular dependencies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two locales every user-facing string exists in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English.
    #[default]
    En,
    /// Arabic.
    Ar,
}

impl Locale {
    /// Returns the BCP 47 language tag for this locale.
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ar => "ar",
        }
    }

    /// Parses a language tag, accepting region suffixes (`en-US`, `ar_SA`).
    ///
    /// Returns `None` for any language other than English or Arabic.
    pub fn from_code(code: &str) -> Option<Self> {
        let lang = code
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match lang.as_str() {
            "en" => Some(Self::En),
            "ar" => Some(Self::Ar),
            _ => None,
        }
    }

    /// Whether text in this locale is laid out right-to-left.
    pub fn is_rtl(self) -> bool {
        matches!(self, Self::Ar)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A static string available in both locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Localized {
    pub en: &'static str,
    pub ar: &'static str,
}

impl Localized {
    pub const EMPTY: Localized = Localized { en: "", ar: "" };

    pub const fn new(en: &'static str, ar: &'static str) -> Self {
        Self { en, ar }
    }

    /// Returns the text for `locale`.
    pub fn get(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => self.en,
            Locale::Ar => self.ar,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.en.is_empty() && self.ar.is_empty()
    }
}

/// Identifier of one step of the signup interview.
///
/// Variants are declared in interview order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Greeting,
    Name,
    Username,
    Email,
    Password,
    ConfirmPassword,
    Dob,
    Country,
    City,
    Terms,
    Creating,
    Welcome,
}

impl StepId {
    /// Every step, in interview order.
    pub const ALL: [StepId; 12] = [
        Self::Greeting,
        Self::Name,
        Self::Username,
        Self::Email,
        Self::Password,
        Self::ConfirmPassword,
        Self::Dob,
        Self::Country,
        Self::City,
        Self::Terms,
        Self::Creating,
        Self::Welcome,
    ];

    /// Returns the snake_case label for this step.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Name => "name",
            Self::Username => "username",
            Self::Email => "email",
            Self::Password => "password",
            Self::ConfirmPassword => "confirm_password",
            Self::Dob => "dob",
            Self::Country => "country",
            Self::City => "city",
            Self::Terms => "terms",
            Self::Creating => "creating",
            Self::Welcome => "welcome",
        }
    }

    /// Whether this step's value is secret and must never be echoed or spoken.
    pub fn is_secret(self) -> bool {
        matches!(self, Self::Password | Self::ConfirmPassword)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-step sub-state of the signup interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// The step's prompt is being asked; the input card may or may not be shown yet.
    #[default]
    Asking,
    /// Audio capture is in progress for a voice step.
    Listening,
    /// A captured or typed value awaits the user's confirmation.
    Confirming,
    /// The user is editing the captured value by hand.
    Editing,
}

/// Transport-level status owned by the turn-taking controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Idle,
    Connecting,
    /// Connected and quiet; the only status in which capture may start.
    Ready,
    Listening,
    /// Captured audio has been committed and a transcript is pending.
    Processing,
    Speaking,
}

impl ConnectionStatus {
    /// Whether the transport session is up, regardless of activity.
    pub fn is_connected(self) -> bool {
        !matches!(self, Self::Idle | Self::Connecting)
    }
}

/// Why the controller is asking the remote model to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechKind {
    Greeting,
    Question,
    Remark,
}

mod form;
mod step;

pub use form::{Country, FormState};
pub use step::StepDefinition;
