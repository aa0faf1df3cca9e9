//! Orchestrator settings.

use crate::engine::{adapters::DEFAULT_ENGINE_TIMEOUT, domain::COPILOT_CLI};
use crate::gate::domain::GateSpec;
use std::collections::BTreeMap;
use std::time::Duration;

/// Settings shared by every phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    default_engine: String,
    engine_timeout: Duration,
    gates_enabled: bool,
    gate_timeout_secs: Option<u64>,
    gate_env: BTreeMap<String, String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_engine: COPILOT_CLI.to_owned(),
            engine_timeout: DEFAULT_ENGINE_TIMEOUT,
            gates_enabled: true,
            gate_timeout_secs: None,
            gate_env: BTreeMap::new(),
        }
    }
}

impl OrchestratorConfig {
    /// Creates the default configuration (`copilot_cli`, 300 s, gates on).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the engine used when a phase names none.
    #[must_use]
    pub fn with_default_engine(mut self, engine: impl Into<String>) -> Self {
        self.default_engine = engine.into();
        self
    }

    /// Sets the per-prompt engine timeout.
    #[must_use]
    pub const fn with_engine_timeout(mut self, timeout: Duration) -> Self {
        self.engine_timeout = timeout;
        self
    }

    /// Enables or disables gate execution in the coder phase.
    ///
    /// With gates disabled the coder commits on engine success alone.
    #[must_use]
    pub const fn with_gates_enabled(mut self, enabled: bool) -> Self {
        self.gates_enabled = enabled;
        self
    }

    /// Caps every gate timeout at `secs` seconds.
    #[must_use]
    pub const fn with_gate_timeout_secs(mut self, secs: u64) -> Self {
        self.gate_timeout_secs = Some(secs);
        self
    }

    /// Adds an environment variable for gate commands.
    #[must_use]
    pub fn with_gate_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.gate_env.insert(key.into(), value.into());
        self
    }

    /// Returns the default engine name.
    #[must_use]
    pub fn default_engine(&self) -> &str {
        &self.default_engine
    }

    /// Returns the engine timeout.
    #[must_use]
    pub const fn engine_timeout(&self) -> Duration {
        self.engine_timeout
    }

    /// Returns whether gates run.
    #[must_use]
    pub const fn gates_enabled(&self) -> bool {
        self.gates_enabled
    }

    /// Returns the gate timeout cap in seconds, if any.
    #[must_use]
    pub const fn gate_timeout_secs(&self) -> Option<u64> {
        self.gate_timeout_secs
    }

    /// Returns `gates` with each timeout limited by the configured cap.
    #[must_use]
    pub fn cap_gates(&self, gates: &[GateSpec]) -> Vec<GateSpec> {
        gates
            .iter()
            .cloned()
            .map(|spec| {
                let secs = spec.timeout().as_secs();
                let capped = self.gate_timeout_secs.map_or(secs, |cap| secs.min(cap));
                spec.with_timeout_secs(capped)
            })
            .collect()
    }

    /// Returns the gate environment.
    #[must_use]
    pub const fn gate_env(&self) -> &BTreeMap<String, String> {
        &self.gate_env
    }
}
