//! Per-field validation rules.
//!
//! Validation runs on normalized values before anything is written to the
//! form. A rejected value leaves the form untouched; the caller shows the
//! error's localized message inline.

use crate::error::FieldError;
use chrono::{NaiveDate, Utc};
use voxsign_types::{FormState, StepId};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Minimum applicant age in whole years.
pub const MIN_AGE_YEARS: u32 = 13;

const MAX_NAME_CHARS: usize = 64;
const MIN_USERNAME_CHARS: usize = 3;
const MAX_USERNAME_CHARS: usize = 30;
const MAX_EMAIL_LOCAL_CHARS: usize = 64;

/// Values from other fields that some rules depend on.
#[derive(Debug, Clone)]
pub struct ValidationContext<'a> {
    /// The already-committed password, for the confirmation step.
    pub password: &'a str,
    /// Whether the terms checkbox is ticked.
    pub agreed_to_terms: bool,
    /// The date used to judge the date of birth.
    pub today: NaiveDate,
}

impl<'a> ValidationContext<'a> {
    /// Builds a context from the current form, judged against today's UTC date.
    pub fn from_form(form: &'a FormState) -> Self {
        Self {
            password: &form.password,
            agreed_to_terms: form.agreed_to_terms,
            today: Utc::now().date_naive(),
        }
    }

    pub fn with_terms(mut self, agreed: bool) -> Self {
        self.agreed_to_terms = agreed;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}

/// Validates a normalized `value` for `step`.
///
/// Steps without input (greeting, creating, welcome) always pass.
pub fn validate(step: StepId, value: &str, ctx: &ValidationContext<'_>) -> Result<(), FieldError> {
    match step {
        StepId::Name => validate_name(value),
        StepId::Username => validate_username(value),
        StepId::Email => validate_email(value),
        StepId::Password => validate_password(value),
        StepId::ConfirmPassword => {
            if value.is_empty() {
                Err(FieldError::Required)
            } else if value != ctx.password {
                Err(FieldError::PasswordMismatch)
            } else {
                Ok(())
            }
        }
        StepId::Dob => validate_dob(value, ctx.today),
        StepId::Country | StepId::City => {
            if value.trim().is_empty() {
                Err(FieldError::Required)
            } else {
                Ok(())
            }
        }
        StepId::Terms => {
            if ctx.agreed_to_terms {
                Ok(())
            } else {
                Err(FieldError::TermsNotAccepted)
            }
        }
        StepId::Greeting | StepId::Creating | StepId::Welcome => Ok(()),
    }
}

fn validate_name(value: &str) -> Result<(), FieldError> {
    let name = value.trim();
    if name.is_empty() {
        return Err(FieldError::Required);
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(FieldError::NameTooLong {
            max: MAX_NAME_CHARS,
        });
    }
    let allowed = |c: char| {
        c.is_alphabetic() || is_combining_mark(c) || c == ' ' || matches!(c, '\'' | '-' | '.')
    };
    let base_letter = |c: char| c.is_alphabetic() && !is_combining_mark(c);
    if !name.chars().all(allowed) || !name.chars().any(base_letter) {
        return Err(FieldError::NameInvalid);
    }
    Ok(())
}

fn validate_username(value: &str) -> Result<(), FieldError> {
    if value.is_empty() {
        return Err(FieldError::Required);
    }
    let len = value.chars().count();
    if !(MIN_USERNAME_CHARS..=MAX_USERNAME_CHARS).contains(&len) {
        return Err(FieldError::UsernameLength {
            min: MIN_USERNAME_CHARS,
            max: MAX_USERNAME_CHARS,
        });
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(FieldError::UsernameInvalid);
    }
    Ok(())
}

/// Diacritics written on top of a letter: Latin combining accents, Arabic
/// harakat and Quranic annotation marks.
fn is_combining_mark(c: char) -> bool {
    matches!(c,
        '\u{0300}'..='\u{036F}'
        | '\u{0610}'..='\u{061A}'
        | '\u{064B}'..='\u{065F}'
        | '\u{0670}'
        | '\u{06D6}'..='\u{06DC}'
        | '\u{06DF}'..='\u{06E4}'
        | '\u{06E7}'..='\u{06E8}'
        | '\u{06EA}'..='\u{06ED}')
}

/// Structural email check: one `@`, a sane local part, and a dotted domain
/// whose last label is at least two letters.
fn validate_email(value: &str) -> Result<(), FieldError> {
    if value.is_empty() {
        return Err(FieldError::Required);
    }
    let (local, domain) = value.split_once('@').ok_or(FieldError::EmailInvalid)?;

    let local_ok = !local.is_empty()
        && local.chars().count() <= MAX_EMAIL_LOCAL_CHARS
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-'));
    if !local_ok {
        return Err(FieldError::EmailInvalid);
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(FieldError::EmailInvalid);
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let tld_ok = labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()));
    if !labels_ok || !tld_ok {
        return Err(FieldError::EmailInvalid);
    }
    Ok(())
}

fn validate_password(value: &str) -> Result<(), FieldError> {
    if value.is_empty() {
        return Err(FieldError::Required);
    }
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(FieldError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

fn validate_dob(value: &str, today: NaiveDate) -> Result<(), FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError::Required);
    }
    let dob = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| FieldError::DobInvalid)?;
    match today.years_since(dob) {
        None => Err(FieldError::DobInFuture),
        Some(age) if age < MIN_AGE_YEARS => Err(FieldError::TooYoung {
            min_age: MIN_AGE_YEARS,
        }),
        Some(_) => Ok(()),
    }
}
