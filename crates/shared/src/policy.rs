//! Legality of step changes in the production workflow.
//!
//! The workflow is forward-only and advances one step at a time. Every check
//! here is pure and total: an illegal move is a structured invalid
//! [`TransitionResult`], never an error.

use serde::{Deserialize, Serialize};

use crate::domain::Step;

pub const ALREADY_AT_STEP_MESSAGE: &str = "The scene is already at this step.";
pub const BACKWARD_MESSAGE: &str =
    "Cannot move backward; the production workflow only moves forward.";
pub const VALID_MESSAGE: &str = "Valid transition.";
pub const INVALID_MESSAGE: &str = "Invalid transition.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResult {
    pub is_valid: bool,
    pub message: String,
    pub can_advance: bool,
    pub can_go_back: bool,
}

impl TransitionResult {
    fn valid() -> Self {
        Self {
            is_valid: true,
            message: VALID_MESSAGE.to_string(),
            can_advance: true,
            can_go_back: false,
        }
    }

    fn invalid(message: impl Into<String>, can_advance: bool) -> Self {
        Self {
            is_valid: false,
            message: message.into(),
            can_advance,
            can_go_back: false,
        }
    }
}

/// Decides whether a scene may change from one step to another.
pub trait TransitionPolicy: Send + Sync {
    fn validate(&self, from: Step, to: Step) -> TransitionResult;
}

/// The studio workflow: advance exactly one step, never go back.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardOnlyPolicy;

impl TransitionPolicy for ForwardOnlyPolicy {
    fn validate(&self, from: Step, to: Step) -> TransitionResult {
        validate_transition(from, to)
    }
}

pub fn validate_transition(from: Step, to: Step) -> TransitionResult {
    if to == from {
        return TransitionResult::invalid(ALREADY_AT_STEP_MESSAGE, false);
    }

    if to < from {
        return TransitionResult::invalid(BACKWARD_MESSAGE, true);
    }

    match from.next() {
        Some(next) if to == next => TransitionResult::valid(),
        Some(next) => TransitionResult::invalid(skip_message(next), true),
        None => TransitionResult::invalid(INVALID_MESSAGE, false),
    }
}

pub fn is_valid_transition(from: Step, to: Step) -> bool {
    validate_transition(from, to).is_valid
}

fn skip_message(next: Step) -> String {
    format!(
        "Cannot skip steps; the next valid step is \"{}\".",
        next.label()
    )
}

pub fn next_valid_steps(step: Step) -> Vec<Step> {
    step.next().into_iter().collect()
}

pub fn is_first_step(step: Step) -> bool {
    step == Step::FIRST
}

pub fn is_last_step(step: Step) -> bool {
    step == Step::LAST
}

/// Explanation shown when a scene has nowhere to advance from the operator's
/// point of view.
pub fn no_next_steps_message(step: Step) -> String {
    if is_last_step(step) {
        return "This scene is already finished; there are no further steps.".to_string();
    }
    format!(
        "The scene is in \"{}\"; finish this step before advancing.",
        step.label()
    )
}

#[cfg(test)]
#[path = "tests/policy_tests.rs"]
mod tests;
