//! Voice-driven signup interview.
//!
//! The interview walks a fixed script of steps ([`script::STEPS`]). Each
//! prompt is spoken through the turn-taking controller; voice steps are
//! answered by holding a capture control, typed steps through an input
//! field. Transcripts are normalized and validated before anything is
//! committed to the form, and every confirmed voice answer is acknowledged
//! with a short spoken remark.
//!
//! [`machine::SignupMachine`] holds all decisions as a pure reducer.
//! [`session::SignupSession`] runs it against a live speech session and an
//! [`account::AccountCreator`].

pub mod account;
pub mod config;
pub mod error;
pub mod machine;
pub mod remarks;
pub mod script;
pub mod session;

pub use account::{AccountCreated, AccountCreator, AccountError, HttpAccountCreator};
pub use config::SignupConfig;
pub use error::SignupError;
pub use machine::{SignupEffect, SignupEvent, SignupMachine};
pub use remarks::{FixedPicker, RandomPicker, RemarkPicker};
pub use session::{
    realtime_session, SignupHandle, SignupOutcome, SignupSession, SignupSnapshot, UiCommand,
};
