//! Error types for engine names, statuses, and backend execution.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors returned while constructing engine domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineDomainError {
    /// The engine name is empty after trimming.
    #[error("engine name must not be empty")]
    EmptyEngineName,

    /// The engine name contains characters outside `[a-z0-9_]`.
    #[error("invalid engine name '{0}', expected [a-z0-9_]")]
    InvalidEngineName(String),

    /// The engine name exceeds the maximum length.
    #[error("engine name '{0}' exceeds 100 characters")]
    EngineNameTooLong(String),
}

/// Error returned while parsing engine statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown engine status: {0}")]
pub struct ParseEngineStatusError(pub String);

/// Failure of one backend invocation.
///
/// Adapters convert these into failed responses; they never cross the
/// adapter boundary as errors.
#[derive(Debug, Clone, Error)]
pub enum EngineExecutionError {
    /// The backend executable is not installed.
    #[error("{0} not found. Is it installed?")]
    NotFound(String),

    /// The backend exceeded its execution budget and was killed.
    #[error("Command timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The session was stopped while the backend was running.
    #[error("execution cancelled by session stop")]
    Cancelled,

    /// The backend exited unsuccessfully.
    #[error("{message}")]
    Failed {
        /// Exit code, `-1` when killed by a signal.
        exit_code: i32,
        /// Captured diagnostic output.
        message: String,
    },

    /// The backend could not be spawned or its output could not be read.
    #[error("Command execution failed: {0}")]
    Io(Arc<std::io::Error>),
}

impl EngineExecutionError {
    pub(crate) fn io(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }

    /// Returns the backend exit code when it ran to completion.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Failed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}
