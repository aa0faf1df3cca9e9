//! Allow/block-listed shell execution under a wall-clock budget.

use super::{SandboxError, SandboxResult};
use crate::process::{Capture, exit_code, kill_and_reap, wait_for_output};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Budget applied when neither the caller nor the runner names one.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Executables that are always refused, whatever the caller configures.
pub const DEFAULT_BLOCKED_COMMANDS: &[&str] = &[
    "rm",
    "rmdir",
    "del",
    "format",
    "mkfs",
    "dd",
    "fdisk",
    "parted",
    "chmod",
    "chown",
    "chgrp",
    "sudo",
    "su",
    "wget",
    "curl",
    "nc",
    "netcat",
    "ssh",
    "scp",
    "sftp",
    "systemctl",
    "service",
    "reboot",
    "shutdown",
    "poweroff",
    "halt",
];

/// Captured result of a command that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Process exit code, `-1` when the process died by signal.
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Returns stdout followed by stderr.
    #[must_use]
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }

    /// Returns `true` when the process exited with code zero.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs shell commands after checking the executable name against policy.
///
/// The deny-set always contains [`DEFAULT_BLOCKED_COMMANDS`]. When an
/// allow-set is configured, only executables it names may run.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    allowed: Option<BTreeSet<String>>,
    blocked: BTreeSet<String>,
    default_timeout: Duration,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner {
    /// Creates a runner with the built-in deny-set and no allow-set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allowed: None,
            blocked: DEFAULT_BLOCKED_COMMANDS
                .iter()
                .map(|name| (*name).to_owned())
                .collect(),
            default_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Restricts execution to the named executables.
    #[must_use]
    pub fn with_allowed_commands(mut self, commands: impl IntoIterator<Item = String>) -> Self {
        self.allowed = Some(commands.into_iter().collect());
        self
    }

    /// Adds executables to the deny-set.
    #[must_use]
    pub fn with_blocked_commands(mut self, commands: impl IntoIterator<Item = String>) -> Self {
        self.blocked.extend(commands);
        self
    }

    /// Overrides the budget used when `run` is not given one.
    #[must_use]
    pub const fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Returns the budget applied when `run` is not given one.
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Checks the executable named by the first token of `command`.
    ///
    /// Any directory prefix is stripped before the lookup, so `/bin/rm` is
    /// treated like `rm`. The deny-set is consulted before the allow-set.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Security`] for an empty command, a blocked
    /// executable, or an executable missing from a configured allow-set.
    pub fn validate_command(&self, command: &str) -> SandboxResult<()> {
        let Some(first) = command.split_whitespace().next() else {
            return Err(SandboxError::security("empty command"));
        };
        let name = first.rsplit('/').next().unwrap_or(first);

        if self.blocked.contains(name) {
            return Err(SandboxError::security(format!(
                "command '{name}' is blocked for security reasons"
            )));
        }

        match &self.allowed {
            Some(allowed) if !allowed.contains(name) => {
                let names = allowed.iter().cloned().collect::<Vec<_>>().join(", ");
                Err(SandboxError::security(format!(
                    "command '{name}' is not in allowed commands: [{names}]"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Non-failing variant of [`CommandRunner::validate_command`].
    #[must_use]
    pub fn is_allowed(&self, command: &str) -> bool {
        self.validate_command(command).is_ok()
    }

    /// Validates and runs `command` through the platform shell.
    ///
    /// `env` entries are layered over the inherited environment. On expiry of
    /// the budget the process is killed and reaped before returning.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Security`] when validation fails,
    /// [`SandboxError::Timeout`] when the budget expires,
    /// [`SandboxError::Spawn`] when the shell cannot start, and
    /// [`SandboxError::Io`] when output collection fails.
    #[instrument(skip(self, env), fields(cwd = ?cwd))]
    pub async fn run(
        &self,
        command: &str,
        cwd: Option<&Path>,
        timeout: Option<Duration>,
        env: &BTreeMap<String, String>,
    ) -> SandboxResult<CommandOutput> {
        self.validate_command(command)?;
        let budget = timeout.unwrap_or(self.default_timeout);

        let mut shell = shell_command(command);
        if let Some(dir) = cwd {
            shell.current_dir(dir);
        }
        shell
            .envs(env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("spawning sandboxed command");
        let mut child = shell
            .spawn()
            .map_err(|err| SandboxError::spawn(command, err))?;
        let mut stdout_capture = Capture::spawn(child.stdout.take());
        let mut stderr_capture = Capture::spawn(child.stderr.take());

        let waited = tokio::time::timeout(
            budget,
            wait_for_output(&mut child, &mut stdout_capture, &mut stderr_capture),
        )
        .await;
        match waited {
            Ok(Ok(finished)) => {
                let code = exit_code(finished.status);
                debug!(exit_code = code, "sandboxed command finished");
                Ok(CommandOutput {
                    exit_code: code,
                    stdout: finished.stdout,
                    stderr: finished.stderr,
                })
            }
            Ok(Err(err)) => {
                stdout_capture.abandon();
                stderr_capture.abandon();
                Err(SandboxError::io(command, err))
            }
            Err(_) => {
                warn!(timeout_ms = budget.as_millis(), "command timed out, killing");
                kill_and_reap(&mut child).await;
                stdout_capture.abandon();
                stderr_capture.abandon();
                Err(SandboxError::Timeout {
                    command: command.to_owned(),
                    timeout: budget,
                })
            }
        }
    }
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut shell = Command::new("cmd");
    shell.arg("/C").arg(command);
    shell
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
    let mut shell = Command::new("sh");
    shell.arg("-c").arg(command);
    shell
}
