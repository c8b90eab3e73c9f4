//! Domain errors for phasegate.

use thiserror::Error;

use super::models::Trigger;

/// Errors raised by workflow operations. All are permanent caller errors.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Task already exists: {0}")]
    AlreadyExists(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Invalid transition: trigger '{trigger}' is not allowed from state '{state}'")]
    InvalidTransition { state: String, trigger: String },

    #[error("Invalid task id: {0:?}")]
    InvalidTaskId(String),

    #[error("State store error: {0}")]
    Store(#[from] StoreError),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Errors from the backing medium of a state store.
///
/// Malformed content is not an error: it reads back as an empty store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Problems found while composing the static transition table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("Ambiguous trigger '{trigger}' from '{source_state}': both '{first}' and '{second}'")]
    AmbiguousTrigger {
        trigger: Trigger,
        source_state: String,
        first: String,
        second: String,
    },

    #[error("Rule references undeclared state: {0}")]
    UnknownState(String),

    #[error("State has no outbound transition: {0}")]
    DeadEnd(String),
}
