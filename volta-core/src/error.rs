//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
///
/// Only [`VoltaError::Configuration`] is fatal to a training run. The other
/// variants are recovered by the component that observes them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VoltaError {
    /// Mismatched approximator dimensions or an unusable parameter snapshot.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Fewer transitions are stored than a sample asked for.
    #[error("Insufficient data: requested {requested} transitions, {available} available")]
    InsufficientData {
        /// Number of transitions asked for.
        requested: usize,
        /// Number of transitions stored.
        available: usize,
    },

    /// The backend of an environment is unreachable or answered with garbage.
    #[error("Environment transport error: {0}")]
    EnvironmentTransport(String),

    /// Action value outside the discrete action set.
    #[error("Invalid action: {0}")]
    InvalidAction(i64),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKey(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueType(String),
}

impl VoltaError {
    /// Returns the [`VoltaError`] inside `err`, if any.
    pub fn classify(err: &anyhow::Error) -> Option<&VoltaError> {
        err.downcast_ref::<VoltaError>()
    }
}
