//! Filters over retained event history.

use super::{Event, EventType};
use crate::workflow::domain::{ProjectId, RunId, TaskId};

/// Selects events from history. Unset fields match everything.
///
/// With a limit, only the most recent matching events are returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    event_type: Option<EventType>,
    project_id: Option<ProjectId>,
    task_id: Option<TaskId>,
    run_id: Option<RunId>,
    limit: Option<usize>,
}

impl HistoryQuery {
    /// Creates a query matching every event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps events of one type.
    #[must_use]
    pub const fn with_event_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    /// Keeps events linked to a project.
    #[must_use]
    pub const fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Keeps events linked to a task.
    #[must_use]
    pub const fn with_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Keeps events linked to a run.
    #[must_use]
    pub const fn with_run(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Returns at most the `limit` newest matches.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the result limit, if any.
    #[must_use]
    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Returns whether `event` passes every set filter.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        self.event_type.is_none_or(|kind| kind == event.event_type())
            && self
                .project_id
                .is_none_or(|id| event.project_id() == Some(id))
            && self.task_id.is_none_or(|id| event.task_id() == Some(id))
            && self.run_id.is_none_or(|id| event.run_id() == Some(id))
    }
}
