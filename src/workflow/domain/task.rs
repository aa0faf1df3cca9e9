//! Task aggregate root, lifecycle status, and workflow phases.

use super::{ParseWorkflowValueError, ProjectId, TaskId, WorkflowDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has been planned but not reviewed.
    Pending,
    /// Task is being worked on outside the approval flow.
    InProgress,
    /// Task is waiting for a human decision.
    AwaitingApproval,
    /// Task may enter the coder phase.
    Approved,
    /// Task was sent back by a reviewer.
    Rejected,
    /// Coder output passed every gate and was committed.
    Completed,
    /// Task was abandoned.
    Cancelled,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::AwaitingApproval => "awaiting_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` when no further transitions are permitted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns `true` when the state machine permits moving to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        match self {
            Self::Pending => matches!(
                target,
                Self::InProgress
                    | Self::AwaitingApproval
                    | Self::Approved
                    | Self::Rejected
                    | Self::Cancelled
            ),
            Self::InProgress => matches!(
                target,
                Self::Pending | Self::AwaitingApproval | Self::Completed | Self::Cancelled
            ),
            Self::AwaitingApproval => {
                matches!(target, Self::Approved | Self::Rejected | Self::Cancelled)
            }
            Self::Approved => matches!(
                target,
                Self::Completed | Self::InProgress | Self::AwaitingApproval | Self::Cancelled
            ),
            Self::Rejected => matches!(target, Self::Pending | Self::Cancelled),
            Self::Completed | Self::Cancelled => false,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseWorkflowValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "awaiting_approval" => Ok(Self::AwaitingApproval),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseWorkflowValueError::new("task status", value)),
        }
    }
}

/// Stage of the governed workflow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Decomposes a specification into tasks.
    Planner,
    /// Produces architecture notes and decision records for a task.
    Architect,
    /// Human review gate between design and implementation.
    ReviewApproval,
    /// Implements an approved task and validates it with gates.
    Coder,
}

impl Phase {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planner => "planner",
            Self::Architect => "architect",
            Self::ReviewApproval => "review_approval",
            Self::Coder => "coder",
        }
    }

    /// Returns the phase that follows this one, `None` after the coder.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Planner => Some(Self::Architect),
            Self::Architect => Some(Self::ReviewApproval),
            Self::ReviewApproval => Some(Self::Coder),
            Self::Coder => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Phase {
    type Error = ParseWorkflowValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "planner" => Ok(Self::Planner),
            "architect" => Ok(Self::Architect),
            "review_approval" => Ok(Self::ReviewApproval),
            "coder" => Ok(Self::Coder),
            _ => Err(ParseWorkflowValueError::new("phase", value)),
        }
    }
}

/// Parameter object for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Owning project.
    pub project_id: ProjectId,
    /// Short task title; must not be blank.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Scheduling priority, higher first.
    pub priority: i32,
    /// Phase that produced the task, if any.
    pub phase: Option<Phase>,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    project_id: ProjectId,
    title: String,
    description: String,
    status: TaskStatus,
    current_phase: Option<Phase>,
    version: u32,
    attempts: u32,
    priority: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted owning project.
    pub project_id: ProjectId,
    /// Persisted title.
    pub title: String,
    /// Persisted description.
    pub description: String,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted phase, if any.
    pub current_phase: Option<Phase>,
    /// Persisted version counter.
    pub version: u32,
    /// Persisted coder attempt counter.
    pub attempts: u32,
    /// Persisted priority.
    pub priority: i32,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a `Pending` task at version 1 with no coder attempts.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::EmptyTaskTitle`] when the title is
    /// blank.
    pub fn new(new_task: NewTask, clock: &impl Clock) -> Result<Self, WorkflowDomainError> {
        let title = new_task.title.trim();
        if title.is_empty() {
            return Err(WorkflowDomainError::EmptyTaskTitle);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            project_id: new_task.project_id,
            title: title.to_owned(),
            description: new_task.description,
            status: TaskStatus::Pending,
            current_phase: new_task.phase,
            version: 1,
            attempts: 0,
            priority: new_task.priority,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            title: data.title,
            description: data.description,
            status: data.status,
            current_phase: data.current_phase,
            version: data.version,
            attempts: data.attempts,
            priority: data.priority,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the current phase, if any.
    #[must_use]
    pub const fn current_phase(&self) -> Option<Phase> {
        self.current_phase
    }

    /// Returns the version of the latest task snapshot.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns how many times the coder phase has been invoked.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Moves the task to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidStatusTransition`] when the state
    /// machine forbids the change.
    pub fn transition_to(
        &mut self,
        target: TaskStatus,
        clock: &impl Clock,
    ) -> Result<(), WorkflowDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(WorkflowDomainError::InvalidStatusTransition {
                task_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.touch(clock);
        Ok(())
    }

    /// Records the phase the task is in.
    pub fn enter_phase(&mut self, phase: Phase, clock: &impl Clock) {
        self.current_phase = Some(phase);
        self.touch(clock);
    }

    /// Counts one more coder invocation and returns the new total.
    pub fn record_attempt(&mut self, clock: &impl Clock) -> u32 {
        self.attempts = self.attempts.saturating_add(1);
        self.touch(clock);
        self.attempts
    }

    /// Applies a revised title and description and bumps the version.
    ///
    /// Returns the new version number.
    pub(crate) fn revise(
        &mut self,
        title: Option<String>,
        description: Option<String>,
        clock: &impl Clock,
    ) -> u32 {
        if let Some(new_title) = title {
            self.title = new_title;
        }
        if let Some(new_description) = description {
            self.description = new_description;
        }
        self.version = self.version.saturating_add(1);
        self.touch(clock);
        self.version
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
