//! Transcript normalization and field validation for the signup form.
//!
//! Speech engines return what they heard, not what the form needs. The
//! [`normalize`] module turns raw transcripts (or typed text) into canonical
//! field values: filler phrases such as "my name is" are stripped, letters
//! spelled out one by one are rejoined, and spoken "at"/"dot" become `@`/`.`
//! in email addresses. The [`validate`] module then decides whether a
//! normalized value may be committed to the form.
//!
//! Both modules are pure. Normalizers are total functions that never panic;
//! validators return a [`FieldError`] that carries a localized message.

pub mod countries;
pub mod error;
pub mod normalize;
pub mod validate;

pub use countries::COUNTRIES;
pub use error::FieldError;
pub use normalize::{
    clean_email, extract_free_text, extract_name, extract_place, extract_username,
    join_spelled_letters, match_country, normalize_for_step,
};
pub use validate::{validate, ValidationContext, MIN_AGE_YEARS, MIN_PASSWORD_LEN};
