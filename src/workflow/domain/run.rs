//! Phase execution records.

use super::{ParseWorkflowValueError, Phase, ProjectId, RunId, TaskId, WorkflowDomainError};
use crate::gate::domain::GateRunReport;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The phase is still executing.
    Running,
    /// The phase finished and its outputs were accepted.
    Success,
    /// The phase failed or its gates did not pass.
    Failure,
    /// The phase exceeded its time budget.
    Timeout,
    /// The phase was stopped before finishing.
    Cancelled,
}

impl RunStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` for every status except `Running`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for RunStatus {
    type Error = ParseWorkflowValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "timeout" => Ok(Self::Timeout),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseWorkflowValueError::new("run status", value)),
        }
    }
}

/// One execution of one phase.
///
/// A run starts `Running` and is completed exactly once. Completion stamps
/// the end time and freezes the record, including any gate report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    id: RunId,
    project_id: ProjectId,
    task_id: Option<TaskId>,
    phase: Phase,
    engine: String,
    status: RunStatus,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    gate_report: Option<GateRunReport>,
    error: Option<String>,
}

impl Run {
    /// Starts a run. `task_id` is `None` for project-scoped phases.
    #[must_use]
    pub fn start(
        project_id: ProjectId,
        task_id: Option<TaskId>,
        phase: Phase,
        engine: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: RunId::new(),
            project_id,
            task_id,
            phase,
            engine: engine.into(),
            status: RunStatus::Running,
            started_at: clock.utc(),
            ended_at: None,
            gate_report: None,
            error: None,
        }
    }

    /// Returns the run identifier.
    #[must_use]
    pub const fn id(&self) -> RunId {
        self.id
    }

    /// Returns the project the run belongs to.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the task, if the run is task-scoped.
    #[must_use]
    pub const fn task_id(&self) -> Option<TaskId> {
        self.task_id
    }

    /// Returns the executed phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the engine name.
    #[must_use]
    pub fn engine(&self) -> &str {
        &self.engine
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Returns the start timestamp.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the end timestamp once completed.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Returns the gate report recorded for this run.
    #[must_use]
    pub const fn gate_report(&self) -> Option<&GateRunReport> {
        self.gate_report.as_ref()
    }

    /// Returns the recorded error message.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns `true` once the run has been completed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }

    /// Completes the run with `status` and an optional error message.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::NonTerminalRunStatus`] for
    /// [`RunStatus::Running`] and [`WorkflowDomainError::RunAlreadyCompleted`]
    /// when the run was already completed.
    pub fn complete(
        &mut self,
        status: RunStatus,
        error: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), WorkflowDomainError> {
        self.ensure_open()?;
        if !status.is_terminal() {
            return Err(WorkflowDomainError::NonTerminalRunStatus(self.id));
        }
        self.status = status;
        self.error = error;
        self.ended_at = Some(clock.utc());
        Ok(())
    }

    /// Completes the run as [`RunStatus::Success`].
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::RunAlreadyCompleted`] when the run was
    /// already completed.
    pub fn succeed(&mut self, clock: &impl Clock) -> Result<(), WorkflowDomainError> {
        self.complete(RunStatus::Success, None, clock)
    }

    /// Completes the run as [`RunStatus::Failure`] with `error`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::RunAlreadyCompleted`] when the run was
    /// already completed.
    pub fn fail(
        &mut self,
        error: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), WorkflowDomainError> {
        self.complete(RunStatus::Failure, Some(error.into()), clock)
    }

    /// Attaches the gate report and completes the run.
    ///
    /// The run succeeds when every gate passed and fails otherwise, naming
    /// the failed gates in the error.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::RunAlreadyCompleted`] when the run was
    /// already completed.
    pub fn complete_with_gates(
        &mut self,
        report: GateRunReport,
        clock: &impl Clock,
    ) -> Result<(), WorkflowDomainError> {
        self.ensure_open()?;
        let (status, error) = if report.all_passed() {
            (RunStatus::Success, None)
        } else {
            (
                RunStatus::Failure,
                Some(format!(
                    "gates failed: {}",
                    report.failed_gate_names().collect::<Vec<_>>().join(", ")
                )),
            )
        };
        self.gate_report = Some(report);
        self.complete(status, error, clock)
    }

    /// Attaches the gate report to an open run without completing it.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::RunAlreadyCompleted`] when the run was
    /// already completed.
    pub fn attach_gate_report(
        &mut self,
        report: GateRunReport,
    ) -> Result<(), WorkflowDomainError> {
        self.ensure_open()?;
        self.gate_report = Some(report);
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), WorkflowDomainError> {
        if self.is_completed() {
            return Err(WorkflowDomainError::RunAlreadyCompleted {
                run_id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }
}
