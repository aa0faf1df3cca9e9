//! Commit collaborator port.

use crate::gate::domain::GateRunReport;
use crate::workflow::domain::{Phase, TaskId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for version-control operations.
pub type VcsResult<T> = Result<T, VcsError>;

/// Everything needed to describe a task's commit.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskCommitRequest {
    /// Task being committed.
    pub task_id: TaskId,
    /// Task title, used as the subject line.
    pub title: String,
    /// Phase that produced the change.
    pub phase: Phase,
    /// Gate outcomes that justified the commit.
    pub gate_report: Option<GateRunReport>,
}

impl TaskCommitRequest {
    /// Formats the structured commit message.
    ///
    /// ```text
    /// [Task <id>] <title>
    ///
    /// Phase: coder
    /// Gates: 2/2 passed
    ///
    /// Automated commit by changeforge
    /// ```
    #[must_use]
    pub fn message(&self) -> String {
        let mut message = format!(
            "[Task {}] {}\n\nPhase: {}\n",
            self.task_id, self.title, self.phase
        );
        if let Some(report) = &self.gate_report {
            message.push_str(&format!(
                "Gates: {}/{} passed\n",
                report.summary.passed, report.summary.total
            ));
            let failed: Vec<&str> = report.failed_gate_names().collect();
            if !failed.is_empty() {
                message.push_str(&format!("Failed: {}\n", failed.join(", ")));
            }
        }
        message.push_str("\nAutomated commit by changeforge");
        message
    }
}

/// Records accepted task output in version control.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommitCollaborator: Send + Sync {
    /// Commits the working tree for a task.
    ///
    /// Returns the commit identifier, or `None` when there was nothing to
    /// commit or no repository to commit into.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError`] when the version-control tool fails.
    async fn create_task_commit(&self, request: TaskCommitRequest) -> VcsResult<Option<String>>;
}

/// Errors returned by commit collaborators.
#[derive(Debug, Clone, Error)]
pub enum VcsError {
    /// A version-control command exited unsuccessfully.
    #[error("`{command}` failed: {stderr}")]
    Command {
        /// The command line that failed.
        command: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The version-control tool could not be run.
    #[error("failed to run `{command}`: {source}")]
    Io {
        /// The command line that was attempted.
        command: String,
        /// Underlying failure.
        source: Arc<std::io::Error>,
    },
}
