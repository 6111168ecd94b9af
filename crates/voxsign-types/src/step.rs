//! Static step definitions.
//!
//! A `StepDefinition` is one entry of the fixed interview script. The list
//! itself lives in `voxsign-signup`; this module only defines its shape.

use crate::{Localized, StepId};

/// One step of the signup interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDefinition {
    /// Which datum or checkpoint this step represents.
    pub id: StepId,
    /// Whether the step may not be skipped.
    pub required: bool,
    /// Whether the answer is captured via speech (`false` means typed input).
    pub voice: bool,
    /// Spoken and displayed prompt. Empty for greeting, creating and welcome.
    pub prompt: Localized,
}

impl StepDefinition {
    pub const fn new(id: StepId, required: bool, voice: bool, prompt: Localized) -> Self {
        Self {
            id,
            required,
            voice,
            prompt,
        }
    }

    /// Whether this step has a prompt to speak when it becomes current.
    pub fn is_prompted(&self) -> bool {
        !self.prompt.is_empty()
    }

    /// Whether this step takes any user input at all.
    pub fn takes_input(&self) -> bool {
        !matches!(
            self.id,
            StepId::Greeting | StepId::Creating | StepId::Welcome
        )
    }
}
