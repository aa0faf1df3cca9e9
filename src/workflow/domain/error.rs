//! Error types for workflow domain validation and parsing.

use super::{RunId, RunStatus, TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating workflow records.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTaskTitle,

    /// The project name is empty after trimming.
    #[error("project name must not be empty")]
    EmptyProjectName,

    /// The requested status change is not permitted by the state machine.
    #[error("task {task_id} cannot transition from {from} to {to}")]
    InvalidStatusTransition {
        /// Task being transitioned.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// The run already reached a terminal status.
    #[error("run {run_id} is already completed with status {status}")]
    RunAlreadyCompleted {
        /// Run being completed.
        run_id: RunId,
        /// Terminal status already recorded.
        status: RunStatus,
    },

    /// A run cannot be completed with the `running` status.
    #[error("run {0} cannot be completed with a non-terminal status")]
    NonTerminalRunStatus(RunId),
}

/// Error returned while parsing workflow enums from strings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseWorkflowValueError {
    /// Kind of value being parsed.
    pub kind: &'static str,
    /// Offending input.
    pub value: String,
}

impl ParseWorkflowValueError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}
