//! Sandbox-backed command executor.

use crate::gate::ports::CommandExecutor;
use crate::sandbox::{CommandOutput, CommandRunner, SandboxResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

#[async_trait]
impl CommandExecutor for CommandRunner {
    async fn run_command(
        &self,
        command: &str,
        cwd: Option<&Path>,
        timeout: Duration,
        env: &BTreeMap<String, String>,
    ) -> SandboxResult<CommandOutput> {
        self.run(command, cwd, Some(timeout), env).await
    }
}
