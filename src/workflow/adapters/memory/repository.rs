//! In-memory workflow repository.

use async_trait::async_trait;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::workflow::{
    domain::{Artifact, ArtifactId, Project, ProjectId, Run, RunId, Task, TaskId, TaskVersion},
    ports::{
        ArtifactFilter, WorkflowRepository, WorkflowRepositoryError, WorkflowRepositoryResult,
    },
};

/// Thread-safe in-memory workflow repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowRepository {
    state: Arc<RwLock<InMemoryWorkflowState>>,
}

#[derive(Debug, Default)]
struct InMemoryWorkflowState {
    projects: HashMap<ProjectId, Project>,
    tasks: HashMap<TaskId, Task>,
    versions: HashMap<TaskId, Vec<TaskVersion>>,
    runs: HashMap<RunId, Run>,
    artifacts: HashMap<ArtifactId, Artifact>,
}

impl InMemoryWorkflowRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> WorkflowRepositoryResult<RwLockReadGuard<'_, InMemoryWorkflowState>> {
        self.state.read().map_err(|err| {
            WorkflowRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> WorkflowRepositoryResult<RwLockWriteGuard<'_, InMemoryWorkflowState>> {
        self.state.write().map_err(|err| {
            WorkflowRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    async fn store_project(&self, project: &Project) -> WorkflowRepositoryResult<()> {
        let mut state = self.write()?;
        if state.projects.contains_key(&project.id()) {
            return Err(WorkflowRepositoryError::duplicate("project", project.id()));
        }
        state.projects.insert(project.id(), project.clone());
        Ok(())
    }

    async fn find_project(&self, id: ProjectId) -> WorkflowRepositoryResult<Option<Project>> {
        Ok(self.read()?.projects.get(&id).cloned())
    }

    async fn create_task(&self, task: &Task) -> WorkflowRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(WorkflowRepositoryError::duplicate("task", task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update_task(&self, task: &Task) -> WorkflowRepositoryResult<()> {
        let mut state = self.write()?;
        let slot = state
            .tasks
            .get_mut(&task.id())
            .ok_or(WorkflowRepositoryError::TaskNotFound(task.id()))?;
        *slot = task.clone();
        Ok(())
    }

    async fn find_task(&self, id: TaskId) -> WorkflowRepositoryResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn list_tasks(&self, project_id: ProjectId) -> WorkflowRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| task.project_id() == project_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|task| (Reverse(task.priority()), task.created_at(), task.id()));
        Ok(tasks)
    }

    async fn create_run(&self, run: &Run) -> WorkflowRepositoryResult<()> {
        let mut state = self.write()?;
        if state.runs.contains_key(&run.id()) {
            return Err(WorkflowRepositoryError::duplicate("run", run.id()));
        }
        state.runs.insert(run.id(), run.clone());
        Ok(())
    }

    async fn update_run(&self, run: &Run) -> WorkflowRepositoryResult<()> {
        let mut state = self.write()?;
        let slot = state
            .runs
            .get_mut(&run.id())
            .ok_or(WorkflowRepositoryError::RunNotFound(run.id()))?;
        *slot = run.clone();
        Ok(())
    }

    async fn find_run(&self, id: RunId) -> WorkflowRepositoryResult<Option<Run>> {
        Ok(self.read()?.runs.get(&id).cloned())
    }

    async fn create_task_version(&self, version: &TaskVersion) -> WorkflowRepositoryResult<()> {
        let mut state = self.write()?;
        if !state.tasks.contains_key(&version.task_id()) {
            return Err(WorkflowRepositoryError::TaskNotFound(version.task_id()));
        }
        let history = state.versions.entry(version.task_id()).or_default();
        if history
            .iter()
            .any(|existing| existing.version() == version.version())
        {
            return Err(WorkflowRepositoryError::duplicate(
                "task version",
                format!("{}@{}", version.task_id(), version.version()),
            ));
        }
        history.push(version.clone());
        history.sort_by_key(TaskVersion::version);
        Ok(())
    }

    async fn list_task_versions(
        &self,
        task_id: TaskId,
    ) -> WorkflowRepositoryResult<Vec<TaskVersion>> {
        Ok(self
            .read()?
            .versions
            .get(&task_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_latest_task_version(
        &self,
        task_id: TaskId,
    ) -> WorkflowRepositoryResult<Option<TaskVersion>> {
        Ok(self
            .read()?
            .versions
            .get(&task_id)
            .and_then(|history| history.last())
            .cloned())
    }

    async fn create_artifact(&self, artifact: &Artifact) -> WorkflowRepositoryResult<()> {
        let mut state = self.write()?;
        if state.artifacts.contains_key(&artifact.id()) {
            return Err(WorkflowRepositoryError::duplicate("artifact", artifact.id()));
        }
        state.artifacts.insert(artifact.id(), artifact.clone());
        Ok(())
    }

    async fn find_artifact(&self, id: ArtifactId) -> WorkflowRepositoryResult<Option<Artifact>> {
        Ok(self.read()?.artifacts.get(&id).cloned())
    }

    async fn list_artifacts(
        &self,
        filter: ArtifactFilter,
    ) -> WorkflowRepositoryResult<Vec<Artifact>> {
        let state = self.read()?;
        let mut artifacts: Vec<Artifact> = state
            .artifacts
            .values()
            .filter(|artifact| filter.matches(artifact))
            .cloned()
            .collect();
        artifacts.sort_by_key(|artifact| (Reverse(artifact.created_at()), artifact.id()));
        Ok(artifacts)
    }
}
