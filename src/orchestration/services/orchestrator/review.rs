//! Review and approval actions taken outside the engine.

use super::Orchestrator;
use crate::artifact::ports::ArtifactStore;
use crate::events::domain::EventType;
use crate::orchestration::services::OrchestrationResult;
use crate::workflow::{
    domain::{Task, TaskId},
    ports::WorkflowRepository,
    services::TaskStatusChange,
};
use mockable::Clock;

impl<R, S, C> Orchestrator<R, S, C>
where
    R: WorkflowRepository,
    S: ArtifactStore,
    C: Clock + Send + Sync,
{
    /// Puts a task up for review.
    ///
    /// # Errors
    ///
    /// Returns [`crate::orchestration::services::OrchestrationError`] when
    /// the task is unknown or cannot enter review from its current status.
    pub async fn submit_for_review(&self, task_id: TaskId) -> OrchestrationResult<Task> {
        let change = self.lifecycle.submit_for_review(task_id).await?;
        Ok(self.announce(change))
    }

    /// Approves a task for coding.
    ///
    /// # Errors
    ///
    /// Returns [`crate::orchestration::services::OrchestrationError`] when
    /// the task is unknown or is neither pending nor awaiting approval.
    pub async fn approve_task(&self, task_id: TaskId) -> OrchestrationResult<Task> {
        let change = self.lifecycle.approve(task_id).await?;
        Ok(self.announce(change))
    }

    /// Rejects a task.
    ///
    /// # Errors
    ///
    /// Returns [`crate::orchestration::services::OrchestrationError`] when
    /// the task is unknown or cannot be rejected from its current status.
    pub async fn reject_task(&self, task_id: TaskId) -> OrchestrationResult<Task> {
        let change = self.lifecycle.reject(task_id).await?;
        Ok(self.announce(change))
    }

    fn announce(&self, change: TaskStatusChange) -> Task {
        let TaskStatusChange { task, previous } = change;
        self.publish(
            self.event(EventType::TaskStatusChanged)
                .with_project(task.project_id())
                .with_task(task.id())
                .with_data("from", previous.as_str())
                .with_data("to", task.status().as_str()),
        );
        task
    }
}
