//! Sequential gate execution and pass/fail evaluation.

use crate::gate::{
    domain::{GateResult, GateSpec, PassCriteria},
    ports::CommandExecutor,
};
use crate::sandbox::{CommandOutput, SandboxError};
use mockable::Clock;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Runs gate specifications and judges their output.
///
/// The runner never fails: refused, timed-out, and unrunnable commands all
/// produce a non-passing [`GateResult`] with exit code `-1`.
#[derive(Clone)]
pub struct GateRunner<C>
where
    C: Clock + Send + Sync,
{
    executor: Arc<dyn CommandExecutor>,
    clock: Arc<C>,
}

impl<C> GateRunner<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a runner over the given executor.
    #[must_use]
    pub const fn new(executor: Arc<dyn CommandExecutor>, clock: Arc<C>) -> Self {
        Self { executor, clock }
    }

    /// Runs one gate with its own timeout.
    #[instrument(skip(self, spec, env), fields(gate = spec.name()))]
    pub async fn run_gate(
        &self,
        spec: &GateSpec,
        cwd: Option<&Path>,
        env: &BTreeMap<String, String>,
    ) -> GateResult {
        let started = Instant::now();
        let outcome = self
            .executor
            .run_command(spec.command(), cwd, spec.timeout(), env)
            .await;
        let gate_name = spec.name().to_owned();

        match outcome {
            Ok(output) => {
                let passed = evaluate(spec, &output);
                info!(passed, exit_code = output.exit_code, "gate finished");
                GateResult::completed(
                    gate_name,
                    passed,
                    output.exit_code,
                    output.stdout,
                    output.stderr,
                    started.elapsed(),
                    self.clock.utc(),
                )
            }
            Err(SandboxError::Security(message)) => {
                warn!(%message, "gate command refused");
                GateResult::errored(
                    gate_name,
                    format!("Security violation: {message}"),
                    started.elapsed(),
                    self.clock.utc(),
                )
            }
            Err(err @ SandboxError::Timeout { .. }) => {
                warn!(%err, "gate timed out");
                GateResult::errored(
                    gate_name,
                    format!("Timeout: {err}"),
                    spec.timeout(),
                    self.clock.utc(),
                )
            }
            Err(err) => {
                warn!(%err, "gate could not run");
                GateResult::errored(
                    gate_name,
                    format!("Execution error: {err}"),
                    started.elapsed(),
                    self.clock.utc(),
                )
            }
        }
    }

    /// Runs gates in order, skipping optional ones.
    ///
    /// With `stop_on_failure` the run halts after the first non-passing gate,
    /// so the returned list is a prefix of the required gates.
    pub async fn run_gates(
        &self,
        specs: &[GateSpec],
        cwd: Option<&Path>,
        env: &BTreeMap<String, String>,
        stop_on_failure: bool,
    ) -> Vec<GateResult> {
        let mut results = Vec::new();
        for spec in specs.iter().filter(|spec| spec.is_required()) {
            let result = self.run_gate(spec, cwd, env).await;
            let passed = result.passed();
            results.push(result);
            if stop_on_failure && !passed {
                break;
            }
        }
        results
    }
}

/// Judges completed command output against the gate's pass criterion.
///
/// Missing expectations and invalid regular expressions degrade to the
/// exit-code check.
fn evaluate(spec: &GateSpec, output: &CommandOutput) -> bool {
    let expected = spec.expected_output().filter(|text| !text.is_empty());
    match spec.pass_criteria() {
        PassCriteria::ExitCode0 | PassCriteria::Unknown => output.succeeded(),
        PassCriteria::OutputContains => {
            expected.map_or_else(|| output.succeeded(), |text| output.combined().contains(text))
        }
        PassCriteria::OutputMatches => expected
            .and_then(|pattern| Regex::new(pattern).ok())
            .map_or_else(|| output.succeeded(), |re| re.is_match(&output.combined())),
    }
}
