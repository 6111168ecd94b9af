//! Signup form state and the country record it references.

use crate::{Locale, Localized, StepId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A country the applicant can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    /// ISO 3166-1 alpha-2 code.
    pub code: &'static str,
    /// Display name in both locales.
    pub name: Localized,
}

impl Country {
    pub const fn new(code: &'static str, en: &'static str, ar: &'static str) -> Self {
        Self {
            code,
            name: Localized::new(en, ar),
        }
    }

    pub fn display_name(&self, locale: Locale) -> &'static str {
        self.name.get(locale)
    }
}

/// Values collected by the signup interview.
///
/// Serialized in camelCase when handed to the account creation collaborator.
/// A field is only populated once its step has been confirmed; fields of
/// skipped optional steps stay empty.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub date_of_birth: String,
    pub country: String,
    pub country_code: String,
    pub city: String,
    pub agreed_to_terms: bool,
}

impl fmt::Debug for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormState")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("confirm_password", &"[REDACTED]")
            .field("date_of_birth", &self.date_of_birth)
            .field("country", &self.country)
            .field("country_code", &self.country_code)
            .field("city", &self.city)
            .field("agreed_to_terms", &self.agreed_to_terms)
            .finish()
    }
}

impl FormState {
    /// Returns the text value backing `step`, if the step stores one.
    ///
    /// The country step reports the display name; `country_code` is only
    /// reachable through the field itself.
    pub fn value(&self, step: StepId) -> Option<&str> {
        let value = match step {
            StepId::Name => &self.name,
            StepId::Username => &self.username,
            StepId::Email => &self.email,
            StepId::Password => &self.password,
            StepId::ConfirmPassword => &self.confirm_password,
            StepId::Dob => &self.date_of_birth,
            StepId::Country => &self.country,
            StepId::City => &self.city,
            StepId::Greeting | StepId::Terms | StepId::Creating | StepId::Welcome => return None,
        };
        Some(value.as_str())
    }

    /// Stores `value` in the field backing `step`.
    ///
    /// Returns `false` (and changes nothing) for steps without a text field.
    pub fn set(&mut self, step: StepId, value: impl Into<String>) -> bool {
        let slot = match step {
            StepId::Name => &mut self.name,
            StepId::Username => &mut self.username,
            StepId::Email => &mut self.email,
            StepId::Password => &mut self.password,
            StepId::ConfirmPassword => &mut self.confirm_password,
            StepId::Dob => &mut self.date_of_birth,
            StepId::Country => &mut self.country,
            StepId::City => &mut self.city,
            StepId::Greeting | StepId::Terms | StepId::Creating | StepId::Welcome => return false,
        };
        *slot = value.into();
        true
    }

    /// Stores a matched country: the localized name and its code.
    pub fn set_country(&mut self, country: &Country, locale: Locale) {
        self.country = country.display_name(locale).to_string();
        self.country_code = country.code.to_string();
    }

    /// Empties the field(s) backing `step`.
    pub fn clear(&mut self, step: StepId) {
        match step {
            StepId::Country => {
                self.country.clear();
                self.country_code.clear();
            }
            StepId::Terms => self.agreed_to_terms = false,
            other => {
                self.set(other, String::new());
            }
        }
    }
}
