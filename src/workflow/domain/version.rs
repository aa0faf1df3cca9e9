//! Immutable task snapshots.

use super::{TaskId, TaskVersionId};
use crate::gate::domain::GateSpec;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// One immutable snapshot of a task definition.
///
/// The latest version of a task supplies the gate set the coder phase runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskVersion {
    id: TaskVersionId,
    task_id: TaskId,
    version: u32,
    title: String,
    description: String,
    gates: Vec<GateSpec>,
    dependencies: Vec<String>,
    created_at: DateTime<Utc>,
}

impl TaskVersion {
    /// Creates a snapshot for `task_id` at `version`.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        version: u32,
        title: impl Into<String>,
        description: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: TaskVersionId::new(),
            task_id,
            version,
            title: title.into(),
            description: description.into(),
            gates: Vec::new(),
            dependencies: Vec::new(),
            created_at: clock.utc(),
        }
    }

    /// Sets the gate set validated by the coder phase.
    #[must_use]
    pub fn with_gates(mut self, gates: impl IntoIterator<Item = GateSpec>) -> Self {
        self.gates = gates.into_iter().collect();
        self
    }

    /// Sets free-form dependency labels.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = String>) -> Self {
        self.dependencies = dependencies.into_iter().collect();
        self
    }

    /// Returns the snapshot identifier.
    #[must_use]
    pub const fn id(&self) -> TaskVersionId {
        self.id
    }

    /// Returns the task this snapshot belongs to.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the version number, starting at 1.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns the title captured by this snapshot.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description captured by this snapshot.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the gate set.
    #[must_use]
    pub fn gates(&self) -> &[GateSpec] {
        &self.gates
    }

    /// Returns the dependency labels.
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
