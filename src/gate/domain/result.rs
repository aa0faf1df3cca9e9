//! Gate outcomes and aggregate statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Serializes a [`Duration`] as fractional seconds.
mod seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(
        value: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Outcome of one gate execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    gate_name: String,
    passed: bool,
    exit_code: i32,
    stdout: String,
    stderr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(with = "seconds")]
    execution_time: Duration,
    executed_at: DateTime<Utc>,
}

impl GateResult {
    /// Records a gate whose command ran to completion.
    #[must_use]
    pub const fn completed(
        gate_name: String,
        passed: bool,
        exit_code: i32,
        stdout: String,
        stderr: String,
        execution_time: Duration,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            gate_name,
            passed,
            exit_code,
            stdout,
            stderr,
            error: None,
            execution_time,
            executed_at,
        }
    }

    /// Records a gate that could not run; exit code is `-1`.
    #[must_use]
    pub const fn errored(
        gate_name: String,
        error: String,
        execution_time: Duration,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            gate_name,
            passed: false,
            exit_code: -1,
            stdout: String::new(),
            stderr: String::new(),
            error: Some(error),
            execution_time,
            executed_at,
        }
    }

    /// Returns the gate name.
    #[must_use]
    pub fn gate_name(&self) -> &str {
        &self.gate_name
    }

    /// Returns `true` when the gate passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.passed
    }

    /// Returns the exit code, `-1` when the gate could not run.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Returns captured standard output.
    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Returns captured standard error.
    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// Returns the failure description when the gate could not run.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the wall-clock time spent on the gate.
    #[must_use]
    pub const fn execution_time(&self) -> Duration {
        self.execution_time
    }

    /// Returns when the gate finished.
    #[must_use]
    pub const fn executed_at(&self) -> DateTime<Utc> {
        self.executed_at
    }
}

/// Returns `true` when every result passed. An empty slice counts as passed.
#[must_use]
pub fn all_passed(results: &[GateResult]) -> bool {
    results.iter().all(GateResult::passed)
}

/// Aggregate statistics over a set of gate results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateSummary {
    /// Number of gates executed.
    pub total: usize,
    /// Number of gates that passed.
    pub passed: usize,
    /// Number of gates that did not pass.
    pub failed: usize,
    /// `passed / total`, or `0.0` when nothing ran.
    pub pass_rate: f64,
    /// Sum of the execution times of every gate.
    #[serde(with = "seconds")]
    pub total_execution_time: Duration,
    /// `true` when `passed == total`.
    pub all_passed: bool,
}

impl GateSummary {
    /// Computes the summary of `results`.
    #[must_use]
    pub fn from_results(results: &[GateResult]) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|result| result.passed).count();
        let total_execution_time = results.iter().map(GateResult::execution_time).sum();
        Self {
            total,
            passed,
            failed: total.saturating_sub(passed),
            pass_rate: ratio(passed, total),
            total_execution_time,
            all_passed: passed == total,
        }
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "pass rate is a fractional statistic by definition"
)]
fn ratio(passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let to_f64 = |count: usize| u32::try_from(count).map_or(f64::from(u32::MAX), f64::from);
    to_f64(passed) / to_f64(total)
}

/// Gate results together with their summary, as stored on a run and handed
/// to the commit collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateRunReport {
    /// Per-gate outcomes in execution order.
    pub results: Vec<GateResult>,
    /// Aggregate statistics over `results`.
    pub summary: GateSummary,
}

impl GateRunReport {
    /// Builds a report from results, computing the summary.
    #[must_use]
    pub fn new(results: Vec<GateResult>) -> Self {
        let summary = GateSummary::from_results(&results);
        Self { results, summary }
    }

    /// Returns `true` when every gate in the report passed.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.summary.all_passed
    }

    /// Returns the names of gates that did not pass.
    pub fn failed_gate_names(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .filter(|result| !result.passed)
            .map(GateResult::gate_name)
    }
}
