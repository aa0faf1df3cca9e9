//! Results reported by phase executions.

use crate::gate::domain::GateRunReport;
use crate::workflow::domain::{Artifact, Run, RunStatus, TaskId};
use serde_json::Value;

/// Result of a planner or architect run.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseOutcome {
    /// The completed run.
    pub run: Run,
    /// Tasks created by the phase.
    pub task_ids: Vec<TaskId>,
    /// Artifacts stored by the phase, in creation order.
    pub artifacts: Vec<Artifact>,
    /// Structured phase output (the plan or architecture document).
    pub document: Value,
    /// `true` when the response held no decodable JSON.
    pub degraded: bool,
    /// Failure recorded on the run, if any.
    pub error: Option<String>,
}

impl PhaseOutcome {
    /// Returns `true` when the run succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.run.status() == RunStatus::Success
    }
}

/// Result of a coder run.
///
/// Gate failures and execution failures are distinct: the first asks for a
/// retry of an approved task, the second points at the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum CoderOutcome {
    /// Every gate passed and the task was completed.
    Completed {
        /// The completed run.
        run: Run,
        /// Gate outcomes.
        report: GateRunReport,
        /// Commit identifier, when one was created.
        commit: Option<String>,
        /// Attempt number of this invocation.
        attempt: u32,
    },
    /// At least one gate failed; the task stays approved.
    GatesFailed {
        /// The failed run.
        run: Run,
        /// Gate outcomes.
        report: GateRunReport,
        /// Attempt number of this invocation.
        attempt: u32,
    },
    /// The engine or session failed before gates could judge the change.
    ExecutionFailed {
        /// The failed run.
        run: Run,
        /// What went wrong.
        error: String,
        /// Attempt number of this invocation.
        attempt: u32,
    },
}

impl CoderOutcome {
    /// Returns the run.
    #[must_use]
    pub const fn run(&self) -> &Run {
        match self {
            Self::Completed { run, .. }
            | Self::GatesFailed { run, .. }
            | Self::ExecutionFailed { run, .. } => run,
        }
    }

    /// Returns the attempt number.
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        match self {
            Self::Completed { attempt, .. }
            | Self::GatesFailed { attempt, .. }
            | Self::ExecutionFailed { attempt, .. } => *attempt,
        }
    }

    /// Returns the gate report, when gates ran.
    #[must_use]
    pub const fn report(&self) -> Option<&GateRunReport> {
        match self {
            Self::Completed { report, .. } | Self::GatesFailed { report, .. } => Some(report),
            Self::ExecutionFailed { .. } => None,
        }
    }

    /// Returns `true` when the task was completed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}
