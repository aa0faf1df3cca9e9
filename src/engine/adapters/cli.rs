//! Engine adapter driving a command-line assistant process per prompt.

use super::session::Session;
use crate::engine::{
    domain::{
        EngineConfig, EngineExecutionError, EngineMessage, EngineName, EngineResponse,
        EngineStatus, MessageRole, SessionContext,
    },
    ports::{ChunkStream, EngineAdapter},
};
use crate::process::{Capture, exit_code, kill_and_reap, wait_for_output};
use async_trait::async_trait;
use mockable::Clock;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Notify;
use tokio_stream::StreamExt;
use tracing::{debug, info, instrument, warn};

/// Execution budget for one prompt when none is configured.
pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(300);

/// Budget for the health check.
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Marker prefixed to the final chunk of a failed stream.
const ERROR_CHUNK_PREFIX: &str = "Error: ";

enum Waited<T> {
    Exited(std::io::Result<T>),
    TimedOut,
    Cancelled,
}

enum NextLine {
    Line(std::io::Result<Option<String>>),
    TimedOut,
    Cancelled,
}

/// Engine backed by a CLI program invoked once per prompt.
///
/// Each prompt runs `program [args…] <prompt>` in the session working
/// directory. The process is killed when it exceeds the execution budget or
/// when [`EngineAdapter::stop_session`] is called while it runs.
#[derive(Debug)]
pub struct CliEngine {
    name: EngineName,
    program: String,
    args: Vec<String>,
    health_args: Vec<String>,
    timeout: Duration,
    health_timeout: Duration,
    session: Session,
    cancel: Arc<Notify>,
}

impl CliEngine {
    /// Creates an engine running `program` with default budgets.
    #[must_use]
    pub fn new(name: EngineName, program: impl Into<String>) -> Self {
        Self {
            name,
            program: program.into(),
            args: Vec::new(),
            health_args: vec!["--version".to_owned()],
            timeout: DEFAULT_ENGINE_TIMEOUT,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            session: Session::default(),
            cancel: Arc::new(Notify::new()),
        }
    }

    /// Creates the `copilot_cli` engine: the `copilot` binary checked with
    /// `--version`.
    #[must_use]
    pub fn copilot(config: &EngineConfig) -> Self {
        Self::new(EngineName::copilot_cli(), "copilot").configured(config)
    }

    /// Applies registry settings on top of the adapter defaults.
    #[must_use]
    pub fn configured(mut self, config: &EngineConfig) -> Self {
        if let Some(timeout) = config.timeout() {
            self.timeout = timeout;
        }
        if let Some(dir) = config.working_directory() {
            self = self.with_working_directory(dir);
        }
        self
    }

    /// Sets fixed arguments placed before the prompt.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the arguments of the health check.
    #[must_use]
    pub fn with_health_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.health_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the per-prompt execution budget.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the health check budget.
    #[must_use]
    pub const fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    /// Sets the working directory used before a session names one.
    #[must_use]
    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.session.set_working_directory(dir.into());
        self
    }

    /// Sets the clock stamping session ids and transcript entries.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.session = self.session.with_clock(clock);
        self
    }

    fn spawn(&self, prompt: &str) -> Result<Child, EngineExecutionError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = self.session.working_directory() {
            command.current_dir(dir);
        }
        command.spawn().map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                EngineExecutionError::NotFound(self.program.clone())
            } else {
                EngineExecutionError::io(err)
            }
        })
    }

    /// Runs one prompt to completion, racing the process against the budget
    /// and the stop notification.
    async fn run_backend(&self, prompt: &str) -> Result<String, EngineExecutionError> {
        let cancelled = self.cancel.notified();
        tokio::pin!(cancelled);
        cancelled.as_mut().enable();

        let mut child = self.spawn(prompt)?;
        let mut stdout_capture = Capture::spawn(child.stdout.take());
        let mut stderr_capture = Capture::spawn(child.stderr.take());

        let waited = tokio::select! {
            finished = wait_for_output(&mut child, &mut stdout_capture, &mut stderr_capture) => {
                Waited::Exited(finished)
            }
            () = tokio::time::sleep(self.timeout) => Waited::TimedOut,
            () = &mut cancelled => Waited::Cancelled,
        };

        let failure = match waited {
            Waited::Exited(Ok(finished)) => {
                if finished.status.success() {
                    return Ok(finished.stdout);
                }
                return Err(failed_exit(exit_code(finished.status), &finished.stderr));
            }
            Waited::Exited(Err(err)) => EngineExecutionError::io(err),
            Waited::TimedOut => {
                warn!(engine = %self.name, "engine prompt timed out, killing");
                kill_and_reap(&mut child).await;
                EngineExecutionError::Timeout(self.timeout)
            }
            Waited::Cancelled => {
                info!(engine = %self.name, "engine prompt cancelled by stop");
                kill_and_reap(&mut child).await;
                EngineExecutionError::Cancelled
            }
        };
        stdout_capture.abandon();
        stderr_capture.abandon();
        Err(failure)
    }

    /// Gathers a streamed reply into a single response.
    async fn execute_collected(&self, command: &str) -> EngineResponse {
        let mut chunks: Vec<String> = self.execute_stream(command).collect().await;
        let status = self.session.status();
        if status.accepts_prompts() {
            return EngineResponse::success(chunks.join("\n"), status);
        }
        let error = chunks
            .pop()
            .map(|last| {
                last.strip_prefix(ERROR_CHUNK_PREFIX)
                    .map_or_else(|| last.clone(), str::to_owned)
            })
            .unwrap_or_default();
        EngineResponse::failure(error, status).with_content(chunks.join("\n"))
    }
}

fn failed_exit(code: i32, stderr: &str) -> EngineExecutionError {
    let diagnostic = stderr.trim();
    let message = if diagnostic.is_empty() {
        format!("Command failed with exit code {code}")
    } else {
        diagnostic.to_owned()
    };
    EngineExecutionError::Failed {
        exit_code: code,
        message,
    }
}

#[async_trait]
impl EngineAdapter for CliEngine {
    fn engine_name(&self) -> &EngineName {
        &self.name
    }

    #[instrument(skip(self, context), fields(engine = %self.name))]
    async fn start_session(&self, context: SessionContext) -> EngineResponse {
        let dir = context.working_directory();
        let session_id = self.session.reset(dir);
        self.session.push(
            self.session
                .message(
                    MessageRole::System,
                    format!("Session started in {}", dir.display()),
                )
                .with_metadata("session_id", session_id.clone()),
        );

        if let Some(prompt) = context.initial_prompt() {
            let primed = self.execute(prompt, false).await;
            if !primed.is_success() {
                self.session.set_status(EngineStatus::Error);
                warn!(error = ?primed.error(), "session priming failed");
                return primed;
            }
        }

        self.session.set_status(EngineStatus::Active);
        debug!(%session_id, "engine session started");
        EngineResponse::success("Session initialized", EngineStatus::Active)
            .with_messages(self.session.transcript())
            .with_metadata("session_id", session_id)
    }

    async fn execute(&self, command: &str, stream: bool) -> EngineResponse {
        let status = self.session.status();
        if !status.accepts_prompts() {
            return EngineResponse::failure(format!("Cannot execute in status {status}"), status);
        }
        if stream {
            return self.execute_collected(command).await;
        }

        let user = self.session.message(MessageRole::User, command);
        self.session.push(user.clone());

        match self.run_backend(command).await {
            Ok(output) => {
                let assistant = self
                    .session
                    .message(MessageRole::Assistant, output.clone())
                    .with_metadata("exit_code", 0);
                self.session.push(assistant.clone());
                EngineResponse::success(output, self.session.status())
                    .with_messages(vec![user, assistant])
                    .with_metadata("exit_code", 0)
            }
            Err(err) => {
                warn!(engine = %self.name, %err, "engine prompt failed");
                let status = if matches!(err, EngineExecutionError::Cancelled) {
                    self.session.status()
                } else {
                    EngineStatus::Error
                };
                let response = EngineResponse::failure(err.to_string(), status);
                match err.exit_code() {
                    Some(code) => response.with_metadata("exit_code", code),
                    None => response,
                }
            }
        }
    }

    fn execute_stream<'a>(&'a self, command: &'a str) -> ChunkStream<'a> {
        Box::pin(async_stream::stream! {
            let status = self.session.status();
            if !status.accepts_prompts() {
                yield format!("{ERROR_CHUNK_PREFIX}Cannot execute in status {status}");
                return;
            }
            self.session.push(self.session.message(MessageRole::User, command));

            let cancelled = self.cancel.notified();
            tokio::pin!(cancelled);
            cancelled.as_mut().enable();

            let mut child = match self.spawn(command) {
                Ok(child) => child,
                Err(err) => {
                    self.session.set_status(EngineStatus::Error);
                    yield format!("{ERROR_CHUNK_PREFIX}{err}");
                    return;
                }
            };
            let mut stderr_capture = Capture::spawn(child.stderr.take());
            let Some(stdout) = child.stdout.take() else {
                self.session.set_status(EngineStatus::Error);
                stderr_capture.abandon();
                yield format!("{ERROR_CHUNK_PREFIX}stdout was not piped");
                return;
            };
            let mut lines = BufReader::new(stdout).lines();
            let deadline = tokio::time::sleep(self.timeout);
            tokio::pin!(deadline);

            let mut collected = Vec::new();
            let interrupted = loop {
                let next = tokio::select! {
                    line = lines.next_line() => NextLine::Line(line),
                    () = &mut deadline => NextLine::TimedOut,
                    () = &mut cancelled => NextLine::Cancelled,
                };
                match next {
                    NextLine::Line(Ok(Some(line))) => {
                        collected.push(line.clone());
                        yield line;
                    }
                    NextLine::Line(Ok(None)) => break None,
                    NextLine::Line(Err(err)) => break Some(EngineExecutionError::io(err)),
                    NextLine::TimedOut => break Some(EngineExecutionError::Timeout(self.timeout)),
                    NextLine::Cancelled => break Some(EngineExecutionError::Cancelled),
                }
            };

            let outcome = match interrupted {
                Some(err) => Err(err),
                None => {
                    let waited = tokio::select! {
                        status = child.wait() => Waited::Exited(status),
                        () = &mut deadline => Waited::TimedOut,
                        () = &mut cancelled => Waited::Cancelled,
                    };
                    match waited {
                        Waited::Exited(Ok(status)) => Ok(status),
                        Waited::Exited(Err(err)) => Err(EngineExecutionError::io(err)),
                        Waited::TimedOut => Err(EngineExecutionError::Timeout(self.timeout)),
                        Waited::Cancelled => Err(EngineExecutionError::Cancelled),
                    }
                }
            };

            match outcome {
                Ok(status) if status.success() => {
                    stderr_capture.abandon();
                    self.session.push(
                        self.session
                            .message(MessageRole::Assistant, collected.join("\n"))
                            .with_metadata("exit_code", exit_code(status)),
                    );
                }
                Ok(status) => {
                    let stderr = tokio::select! {
                        collected = stderr_capture.collect() => collected.unwrap_or_default(),
                        () = &mut deadline => String::new(),
                    };
                    stderr_capture.abandon();
                    self.session.set_status(EngineStatus::Error);
                    yield format!("{ERROR_CHUNK_PREFIX}{}", failed_exit(exit_code(status), &stderr));
                }
                Err(err) => {
                    kill_and_reap(&mut child).await;
                    stderr_capture.abandon();
                    if !matches!(err, EngineExecutionError::Cancelled) {
                        self.session.set_status(EngineStatus::Error);
                    }
                    warn!(engine = %self.name, %err, "engine stream failed");
                    yield format!("{ERROR_CHUNK_PREFIX}{err}");
                }
            }
        })
    }

    async fn stop_session(&self) -> EngineResponse {
        if self.session.stop() {
            info!(engine = %self.name, "engine session stopped");
        }
        self.cancel.notify_waiters();
        let response = EngineResponse::success("Session stopped", EngineStatus::Stopped);
        match self.session.session_id() {
            Some(id) => response.with_metadata("session_id", id),
            None => response,
        }
    }

    fn transcript(&self) -> Vec<EngineMessage> {
        self.session.transcript()
    }

    fn status(&self) -> EngineStatus {
        self.session.status()
    }

    async fn health_check(&self) -> bool {
        let mut check = Command::new(&self.program);
        check
            .args(&self.health_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(self.health_timeout, check.status()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(err)) => {
                debug!(engine = %self.name, %err, "health check could not run");
                false
            }
            Err(_) => {
                warn!(engine = %self.name, "health check timed out");
                false
            }
        }
    }
}
