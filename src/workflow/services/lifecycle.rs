//! Service layer for project and task lifecycle management.

use crate::gate::domain::GateSpec;
use crate::workflow::{
    domain::{
        NewTask, Phase, Project, ProjectId, Task, TaskId, TaskStatus, TaskVersion,
        WorkflowDomainError,
    },
    ports::{WorkflowRepository, WorkflowRepositoryError},
};
use mockable::Clock;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Request payload for creating a task together with its first version.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTaskRequest {
    project_id: ProjectId,
    title: String,
    description: String,
    priority: i32,
    phase: Option<Phase>,
    gates: Vec<GateSpec>,
    dependencies: Vec<String>,
}

impl CreateTaskRequest {
    /// Creates a request with required fields.
    #[must_use]
    pub fn new(project_id: ProjectId, title: impl Into<String>) -> Self {
        Self {
            project_id,
            title: title.into(),
            description: String::new(),
            priority: 0,
            phase: None,
            gates: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the phase that produced the task.
    #[must_use]
    pub const fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Sets the gates of the initial version.
    #[must_use]
    pub fn with_gates(mut self, gates: impl IntoIterator<Item = GateSpec>) -> Self {
        self.gates = gates.into_iter().collect();
        self
    }

    /// Sets the dependency labels of the initial version.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = String>) -> Self {
        self.dependencies = dependencies.into_iter().collect();
        self
    }
}

/// Request payload for recording a new task version.
///
/// Unset fields carry over from the latest version.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviseTaskRequest {
    title: Option<String>,
    description: Option<String>,
    gates: Option<Vec<GateSpec>>,
    dependencies: Option<Vec<String>>,
}

impl ReviseTaskRequest {
    /// Creates an empty revision.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replaces the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replaces the gate set.
    #[must_use]
    pub fn with_gates(mut self, gates: impl IntoIterator<Item = GateSpec>) -> Self {
        self.gates = Some(gates.into_iter().collect());
        self
    }

    /// Replaces the dependency labels.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = String>) -> Self {
        self.dependencies = Some(dependencies.into_iter().collect());
        self
    }
}

/// A persisted status change and the status it replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatusChange {
    /// Task after the change.
    pub task: Task,
    /// Status before the change.
    pub previous: TaskStatus,
}

/// Service-level errors for workflow lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] WorkflowDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] WorkflowRepositoryError),
    /// The project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
}

/// Result type for workflow lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Project and task lifecycle service.
#[derive(Clone)]
pub struct TaskLifecycleService<R, C>
where
    R: WorkflowRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> TaskLifecycleService<R, C>
where
    R: WorkflowRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new lifecycle service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Registers a project rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when the name is blank or the
    /// repository rejects persistence.
    pub async fn create_project(
        &self,
        name: impl Into<String>,
        root: impl Into<PathBuf>,
    ) -> TaskLifecycleResult<Project> {
        let project = Project::new(name, root, &*self.clock)?;
        self.repository.store_project(&project).await?;
        info!(project_id = %project.id(), name = project.name(), "project registered");
        Ok(project)
    }

    /// Creates a `Pending` task and its version 1 snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::ProjectNotFound`] when the project does
    /// not exist, or domain and repository errors otherwise.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskLifecycleResult<Task> {
        if self
            .repository
            .find_project(request.project_id)
            .await?
            .is_none()
        {
            return Err(TaskLifecycleError::ProjectNotFound(request.project_id));
        }
        let task = Task::new(
            NewTask {
                project_id: request.project_id,
                title: request.title,
                description: request.description,
                priority: request.priority,
                phase: request.phase,
            },
            &*self.clock,
        )?;
        let version = TaskVersion::new(
            task.id(),
            task.version(),
            task.title(),
            task.description(),
            &*self.clock,
        )
        .with_gates(request.gates)
        .with_dependencies(request.dependencies);
        self.repository.create_task(&task).await?;
        self.repository.create_task_version(&version).await?;
        Ok(task)
    }

    /// Records a new version, carrying unset fields over from the latest one.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] when the task does not
    /// exist, or repository errors otherwise.
    pub async fn revise_task(
        &self,
        task_id: TaskId,
        request: ReviseTaskRequest,
    ) -> TaskLifecycleResult<TaskVersion> {
        let mut task = self.load_task(task_id).await?;
        let latest = self.repository.get_latest_task_version(task_id).await?;
        let (previous_gates, previous_dependencies) = latest
            .map(|version| (version.gates().to_vec(), version.dependencies().to_vec()))
            .unwrap_or_default();

        let version_number = task.revise(request.title, request.description, &*self.clock);
        let version = TaskVersion::new(
            task_id,
            version_number,
            task.title(),
            task.description(),
            &*self.clock,
        )
        .with_gates(request.gates.unwrap_or(previous_gates))
        .with_dependencies(request.dependencies.unwrap_or(previous_dependencies));
        self.repository.create_task_version(&version).await?;
        self.repository.update_task(&task).await?;
        Ok(version)
    }

    /// Moves a task to `AwaitingApproval` in the review phase.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] when the transition is not
    /// permitted.
    pub async fn submit_for_review(&self, task_id: TaskId) -> TaskLifecycleResult<TaskStatusChange> {
        self.change_status(task_id, TaskStatus::AwaitingApproval, Some(Phase::ReviewApproval))
            .await
    }

    /// Approves a pending or awaiting task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] when the transition is not
    /// permitted.
    pub async fn approve(&self, task_id: TaskId) -> TaskLifecycleResult<TaskStatusChange> {
        self.change_status(task_id, TaskStatus::Approved, None).await
    }

    /// Rejects a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] when the transition is not
    /// permitted.
    pub async fn reject(&self, task_id: TaskId) -> TaskLifecycleResult<TaskStatusChange> {
        self.change_status(task_id, TaskStatus::Rejected, None).await
    }

    /// Retrieves a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when lookup fails.
    pub async fn find_task(&self, task_id: TaskId) -> TaskLifecycleResult<Option<Task>> {
        Ok(self.repository.find_task(task_id).await?)
    }

    /// Lists a task's versions in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when lookup fails.
    pub async fn versions(&self, task_id: TaskId) -> TaskLifecycleResult<Vec<TaskVersion>> {
        Ok(self.repository.list_task_versions(task_id).await?)
    }

    async fn change_status(
        &self,
        task_id: TaskId,
        target: TaskStatus,
        phase: Option<Phase>,
    ) -> TaskLifecycleResult<TaskStatusChange> {
        let mut task = self.load_task(task_id).await?;
        let previous = task.status();
        task.transition_to(target, &*self.clock)?;
        if let Some(next_phase) = phase {
            task.enter_phase(next_phase, &*self.clock);
        }
        self.repository.update_task(&task).await?;
        info!(task_id = %task_id, from = %previous, to = %target, "task status changed");
        Ok(TaskStatusChange { task, previous })
    }

    async fn load_task(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.repository
            .find_task(task_id)
            .await?
            .ok_or(TaskLifecycleError::TaskNotFound(task_id))
    }
}
