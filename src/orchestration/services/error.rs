//! Orchestration error taxonomy.

use crate::artifact::ports::ArtifactStoreError;
use crate::engine::services::EngineRegistryError;
use crate::workflow::{
    domain::{TaskId, TaskStatus, WorkflowDomainError},
    ports::WorkflowRepositoryError,
    services::TaskLifecycleError,
};
use thiserror::Error;

/// Result type for orchestration operations.
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

/// Precondition, configuration, and infrastructure failures.
///
/// Failures of the engine or gates during a run are not errors; they are
/// recorded on the run and reported in the phase outcome.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// A referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind.
        kind: &'static str,
        /// Requested identifier.
        id: String,
    },

    /// The coder phase requires an approved task.
    #[error("task {task_id} must be approved before coding (status: {status})")]
    NotApproved {
        /// Task that was refused.
        task_id: TaskId,
        /// Its current status.
        status: TaskStatus,
    },

    /// Orchestrator settings are unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The requested engine could not be resolved.
    #[error("engine configuration error: {0}")]
    Engine(#[from] EngineRegistryError),

    /// Workflow persistence failed.
    #[error(transparent)]
    Repository(#[from] WorkflowRepositoryError),

    /// Artifact storage failed.
    #[error(transparent)]
    Artifact(#[from] ArtifactStoreError),

    /// A lifecycle rule was violated.
    #[error(transparent)]
    Domain(#[from] WorkflowDomainError),

    /// A prompt template could not be loaded or rendered.
    #[error("template '{template}' failed: {reason}")]
    Template {
        /// Template name.
        template: String,
        /// Loader or renderer message.
        reason: String,
    },
}

impl OrchestrationError {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Returns `true` for errors caused by settings rather than state.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::Engine(_) | Self::Template { .. }
        )
    }
}

impl From<TaskLifecycleError> for OrchestrationError {
    fn from(err: TaskLifecycleError) -> Self {
        match err {
            TaskLifecycleError::Domain(inner) => Self::Domain(inner),
            TaskLifecycleError::Repository(inner) => Self::Repository(inner),
            TaskLifecycleError::ProjectNotFound(id) => Self::not_found("project", id),
            TaskLifecycleError::TaskNotFound(id) => Self::not_found("task", id),
        }
    }
}
