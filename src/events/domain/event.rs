//! Lifecycle event payloads.

use crate::workflow::domain::{ProjectId, RunId, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// A task was created.
    #[serde(rename = "task.created")]
    TaskCreated,
    /// A task's fields changed.
    #[serde(rename = "task.updated")]
    TaskUpdated,
    /// A task was deleted.
    #[serde(rename = "task.deleted")]
    TaskDeleted,
    /// A task moved to a new status.
    #[serde(rename = "task.status_changed")]
    TaskStatusChanged,
    /// An artifact was stored.
    #[serde(rename = "artifact.created")]
    ArtifactCreated,
    /// An artifact was removed.
    #[serde(rename = "artifact.deleted")]
    ArtifactDeleted,
    /// A run began.
    #[serde(rename = "run.started")]
    RunStarted,
    /// A run finished successfully.
    #[serde(rename = "run.completed")]
    RunCompleted,
    /// A run finished unsuccessfully.
    #[serde(rename = "run.failed")]
    RunFailed,
    /// A run emitted a log line.
    #[serde(rename = "run.log")]
    RunLog,
    /// A phase began for a task or project.
    #[serde(rename = "phase.started")]
    PhaseStarted,
    /// A phase finished for a task or project.
    #[serde(rename = "phase.completed")]
    PhaseCompleted,
}

impl EventType {
    /// Returns the dotted wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "task.created",
            Self::TaskUpdated => "task.updated",
            Self::TaskDeleted => "task.deleted",
            Self::TaskStatusChanged => "task.status_changed",
            Self::ArtifactCreated => "artifact.created",
            Self::ArtifactDeleted => "artifact.deleted",
            Self::RunStarted => "run.started",
            Self::RunCompleted => "run.completed",
            Self::RunFailed => "run.failed",
            Self::RunLog => "run.log",
            Self::PhaseStarted => "phase.started",
            Self::PhaseCompleted => "phase.completed",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timestamped lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    event_type: EventType,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_id: Option<ProjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    run_id: Option<RunId>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    data: Map<String, Value>,
}

impl Event {
    /// Creates an event stamped with the current clock time.
    #[must_use]
    pub fn new(event_type: EventType, clock: &impl Clock) -> Self {
        Self {
            event_type,
            timestamp: clock.utc(),
            project_id: None,
            task_id: None,
            run_id: None,
            data: Map::new(),
        }
    }

    /// Links the event to a project.
    #[must_use]
    pub const fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Links the event to a task.
    #[must_use]
    pub const fn with_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Links the event to a run.
    #[must_use]
    pub const fn with_run(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Adds one payload field.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Returns the event kind.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Returns when the event was raised.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the linked project.
    #[must_use]
    pub const fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    /// Returns the linked task.
    #[must_use]
    pub const fn task_id(&self) -> Option<TaskId> {
        self.task_id
    }

    /// Returns the linked run.
    #[must_use]
    pub const fn run_id(&self) -> Option<RunId> {
        self.run_id
    }

    /// Returns the payload.
    #[must_use]
    pub const fn data(&self) -> &Map<String, Value> {
        &self.data
    }
}
