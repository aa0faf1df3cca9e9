//! Command execution port used by the gate runner.

use crate::sandbox::{CommandOutput, SandboxResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Executes a gate command under a budget.
///
/// Implementations must report policy violations as
/// [`crate::sandbox::SandboxError::Security`] and expired budgets as
/// [`crate::sandbox::SandboxError::Timeout`] so the runner can classify them.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Runs `command` in `cwd` with `env` layered over the inherited
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns a sandbox error when the command is refused, times out, or
    /// cannot be run.
    async fn run_command(
        &self,
        command: &str,
        cwd: Option<&Path>,
        timeout: Duration,
        env: &BTreeMap<String, String>,
    ) -> SandboxResult<CommandOutput>;
}
