//! Repository port for projects, tasks, versions, runs, and artifacts.

use crate::workflow::domain::{
    Artifact, ArtifactId, ArtifactType, Project, ProjectId, Run, RunId, Task, TaskId, TaskVersion,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for workflow repository operations.
pub type WorkflowRepositoryResult<T> = Result<T, WorkflowRepositoryError>;

/// Criteria for listing artifacts. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtifactFilter {
    /// Restrict to one project.
    pub project_id: Option<ProjectId>,
    /// Restrict to one task.
    pub task_id: Option<TaskId>,
    /// Restrict to one run.
    pub run_id: Option<RunId>,
    /// Restrict to one artifact kind.
    pub artifact_type: Option<ArtifactType>,
}

impl ArtifactFilter {
    /// Matches artifacts produced by `run_id`.
    #[must_use]
    pub fn for_run(run_id: RunId) -> Self {
        Self {
            run_id: Some(run_id),
            ..Self::default()
        }
    }

    /// Matches artifacts linked to `task_id`.
    #[must_use]
    pub fn for_task(task_id: TaskId) -> Self {
        Self {
            task_id: Some(task_id),
            ..Self::default()
        }
    }

    /// Further restricts the filter to one artifact kind.
    #[must_use]
    pub const fn with_type(mut self, artifact_type: ArtifactType) -> Self {
        self.artifact_type = Some(artifact_type);
        self
    }

    /// Returns `true` when `artifact` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, artifact: &Artifact) -> bool {
        self.project_id.is_none_or(|id| artifact.project_id() == id)
            && self.task_id.is_none_or(|id| artifact.task_id() == Some(id))
            && self.run_id.is_none_or(|id| artifact.run_id() == Some(id))
            && self
                .artifact_type
                .is_none_or(|kind| artifact.artifact_type() == kind)
    }
}

/// Workflow persistence contract.
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Stores a new project.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowRepositoryError::Duplicate`] when the identifier is
    /// already taken.
    async fn store_project(&self, project: &Project) -> WorkflowRepositoryResult<()>;

    /// Finds a project by identifier.
    async fn find_project(&self, id: ProjectId) -> WorkflowRepositoryResult<Option<Project>>;

    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowRepositoryError::Duplicate`] when the identifier is
    /// already taken.
    async fn create_task(&self, task: &Task) -> WorkflowRepositoryResult<()>;

    /// Persists changes to an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowRepositoryError::TaskNotFound`] when the task does
    /// not exist.
    async fn update_task(&self, task: &Task) -> WorkflowRepositoryResult<()>;

    /// Finds a task by identifier.
    async fn find_task(&self, id: TaskId) -> WorkflowRepositoryResult<Option<Task>>;

    /// Lists a project's tasks, highest priority first, then oldest first.
    async fn list_tasks(&self, project_id: ProjectId) -> WorkflowRepositoryResult<Vec<Task>>;

    /// Stores a new run.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowRepositoryError::Duplicate`] when the identifier is
    /// already taken.
    async fn create_run(&self, run: &Run) -> WorkflowRepositoryResult<()>;

    /// Persists changes to an existing run.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowRepositoryError::RunNotFound`] when the run does not
    /// exist.
    async fn update_run(&self, run: &Run) -> WorkflowRepositoryResult<()>;

    /// Finds a run by identifier.
    async fn find_run(&self, id: RunId) -> WorkflowRepositoryResult<Option<Run>>;

    /// Appends an immutable task snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowRepositoryError::TaskNotFound`] when the task does
    /// not exist and [`WorkflowRepositoryError::Duplicate`] when the version
    /// number is already recorded.
    async fn create_task_version(&self, version: &TaskVersion) -> WorkflowRepositoryResult<()>;

    /// Lists a task's snapshots in ascending version order.
    async fn list_task_versions(
        &self,
        task_id: TaskId,
    ) -> WorkflowRepositoryResult<Vec<TaskVersion>>;

    /// Returns the snapshot with the highest version number.
    async fn get_latest_task_version(
        &self,
        task_id: TaskId,
    ) -> WorkflowRepositoryResult<Option<TaskVersion>>;

    /// Stores an artifact record.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowRepositoryError::Duplicate`] when the identifier is
    /// already taken.
    async fn create_artifact(&self, artifact: &Artifact) -> WorkflowRepositoryResult<()>;

    /// Finds an artifact record by identifier.
    async fn find_artifact(&self, id: ArtifactId) -> WorkflowRepositoryResult<Option<Artifact>>;

    /// Lists artifact records matching `filter`, newest first.
    async fn list_artifacts(
        &self,
        filter: ArtifactFilter,
    ) -> WorkflowRepositoryResult<Vec<Artifact>>;
}

/// Errors returned by workflow repository implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkflowRepositoryError {
    /// A record with the same key already exists.
    #[error("duplicate {kind}: {key}")]
    Duplicate {
        /// Record kind.
        kind: &'static str,
        /// Conflicting key.
        key: String,
    },

    /// The task was not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The run was not found.
    #[error("run not found: {0}")]
    RunNotFound(RunId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkflowRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    pub(crate) fn duplicate(kind: &'static str, key: impl ToString) -> Self {
        Self::Duplicate {
            kind,
            key: key.to_string(),
        }
    }
}
