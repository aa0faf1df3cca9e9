//! Gate specification and pass criteria.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Budget in seconds applied to a gate that does not name one.
pub const DEFAULT_GATE_TIMEOUT_SECS: u64 = 60;

/// How a gate's command output is judged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassCriteria {
    /// The command must exit with code zero.
    #[default]
    #[serde(rename = "exit_code_0")]
    ExitCode0,
    /// Combined output must contain the expected text.
    #[serde(rename = "output_contains")]
    OutputContains,
    /// Combined output must match the expected regular expression.
    #[serde(rename = "output_matches")]
    OutputMatches,
    /// Unrecognized criterion; judged like [`PassCriteria::ExitCode0`].
    #[serde(rename = "unknown", other)]
    Unknown,
}

impl PassCriteria {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExitCode0 => "exit_code_0",
            Self::OutputContains => "output_contains",
            Self::OutputMatches => "output_matches",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PassCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for PassCriteria {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "exit_code_0" => Self::ExitCode0,
            "output_contains" => Self::OutputContains,
            "output_matches" => Self::OutputMatches,
            _ => Self::Unknown,
        }
    }
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_GATE_TIMEOUT_SECS
}

const fn default_true() -> bool {
    true
}

/// Declarative validation check run after the coder phase.
///
/// The serialized form is the gate wire shape stored on task versions:
/// `{name, description?, command, pass_criteria, expected_output?, timeout,
/// fail_task_on_error, required}` with `timeout` in whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSpec {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    command: String,
    #[serde(default)]
    pass_criteria: PassCriteria,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expected_output: Option<String>,
    #[serde(rename = "timeout", default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default = "default_true")]
    fail_task_on_error: bool,
    #[serde(default = "default_true")]
    required: bool,
}

impl GateSpec {
    /// Creates a required exit-code gate with the default timeout.
    #[must_use]
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            command: command.into(),
            pass_criteria: PassCriteria::ExitCode0,
            expected_output: None,
            timeout_secs: DEFAULT_GATE_TIMEOUT_SECS,
            fail_task_on_error: true,
            required: true,
        }
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the pass criterion.
    #[must_use]
    pub const fn with_pass_criteria(mut self, criteria: PassCriteria) -> Self {
        self.pass_criteria = criteria;
        self
    }

    /// Sets the expected output (substring or regular expression).
    #[must_use]
    pub fn with_expected_output(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = Some(expected.into());
        self
    }

    /// Sets the timeout in whole seconds.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Marks the gate optional; optional gates are skipped entirely.
    #[must_use]
    pub const fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets whether a failure of this gate should fail the task.
    #[must_use]
    pub const fn with_fail_task_on_error(mut self, fail: bool) -> Self {
        self.fail_task_on_error = fail;
        self
    }

    /// Returns the gate name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the command line.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the pass criterion.
    #[must_use]
    pub const fn pass_criteria(&self) -> PassCriteria {
        self.pass_criteria
    }

    /// Returns the expected output, if any.
    #[must_use]
    pub fn expected_output(&self) -> Option<&str> {
        self.expected_output.as_deref()
    }

    /// Returns the execution budget.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns `true` when the gate must be run.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns `true` when a failure should fail the task.
    #[must_use]
    pub const fn fail_task_on_error(&self) -> bool {
        self.fail_task_on_error
    }
}
