use std::fmt;

use shared::{
    domain::{ProductionId, SceneId},
    error::ErrorCode,
    validation::ValidationErrors,
};
use thiserror::Error;

use crate::repository::RepositoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Move,
    Reorder,
    Update,
    Create,
}

impl MutationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MutationKind::Move => "move",
            MutationKind::Reorder => "reorder",
            MutationKind::Update => "update",
            MutationKind::Create => "create",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote write that failed after its optimistic change was rolled back.
#[derive(Debug, Error)]
#[error("failed to {kind} scene {scene_id}: {source}")]
pub struct MutationError {
    pub kind: MutationKind,
    pub scene_id: SceneId,
    #[source]
    pub source: RepositoryError,
}

impl MutationError {
    pub fn friendly_message(&self) -> &'static str {
        friendly_message(&self.source)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("scene draft is invalid: {0}")]
    Invalid(ValidationErrors),
    #[error("scene {0} is not on the board")]
    UnknownScene(SceneId),
    #[error("production {0} is not available")]
    UnknownProduction(ProductionId),
    #[error(transparent)]
    Mutation(#[from] MutationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub const NOT_FOUND_TEXT: &str = "Scene not found; it may have been removed.";
pub const CONNECTION_TEXT: &str = "Connection problem; check your network.";
pub const TIMEOUT_TEXT: &str = "The operation took too long; please try again.";
pub const SERVER_TEXT: &str = "Internal server error; please try again.";
pub const INVALID_DATA_TEXT: &str = "Invalid data; check the scene details.";
pub const GENERIC_TEXT: &str = "An unexpected error occurred; please try again.";

/// Operator-facing text for a remote failure.
pub fn friendly_message(err: &RepositoryError) -> &'static str {
    if err.is_timeout() {
        return TIMEOUT_TEXT;
    }
    match err {
        RepositoryError::Status {
            code: Some(ErrorCode::NotFound),
            ..
        } => NOT_FOUND_TEXT,
        RepositoryError::Status {
            code: Some(ErrorCode::Validation),
            ..
        } => INVALID_DATA_TEXT,
        RepositoryError::Status { status, .. } => match *status {
            404 => NOT_FOUND_TEXT,
            400 | 422 => INVALID_DATA_TEXT,
            500..=599 => SERVER_TEXT,
            _ => GENERIC_TEXT,
        },
        RepositoryError::Transport(_) | RepositoryError::Unavailable(_) => CONNECTION_TEXT,
        RepositoryError::InvalidUrl(_) | RepositoryError::NotABase(_) => GENERIC_TEXT,
    }
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
