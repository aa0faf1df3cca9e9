//! Error taxonomy for sandbox policy checks and guarded execution.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for sandbox operations.
pub type SandboxResult<T> = Result<T, SandboxError>;

/// Errors raised by the sandbox boundary.
#[derive(Debug, Clone, Error)]
pub enum SandboxError {
    /// A command or path violated sandbox policy. Never retried automatically.
    #[error("security violation: {0}")]
    Security(String),

    /// The command exceeded its wall-clock budget and was killed.
    #[error("command exceeded timeout of {timeout:?}: {command}")]
    Timeout {
        /// Command line that was killed.
        command: String,
        /// Budget that expired.
        timeout: Duration,
    },

    /// An allow-list glob pattern could not be compiled.
    #[error("invalid allow-list pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Offending pattern.
        pattern: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The process could not be spawned.
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        /// Command line that failed to start.
        command: String,
        /// Underlying OS error.
        source: Arc<std::io::Error>,
    },

    /// Reading process output or walking the filesystem failed.
    #[error("I/O failure for '{context}': {source}")]
    Io {
        /// Command line or path being processed.
        context: String,
        /// Underlying OS error.
        source: Arc<std::io::Error>,
    },
}

impl SandboxError {
    /// Builds a policy violation error.
    pub fn security(message: impl Into<String>) -> Self {
        Self::Security(message.into())
    }

    pub(crate) fn spawn(command: &str, err: std::io::Error) -> Self {
        Self::Spawn {
            command: command.to_owned(),
            source: Arc::new(err),
        }
    }

    pub(crate) fn io(context: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source: Arc::new(err),
        }
    }

    /// Returns `true` for policy violations.
    #[must_use]
    pub const fn is_security(&self) -> bool {
        matches!(self, Self::Security(_))
    }

    /// Returns `true` when the process was killed for exceeding its budget.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
