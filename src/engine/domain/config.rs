//! Engine construction settings and session context.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings handed to an engine constructor by the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    working_directory: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl EngineConfig {
    /// Creates an empty configuration; adapters apply their own defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default working directory for backend processes.
    #[must_use]
    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Sets the per-prompt execution budget.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the configured working directory, if any.
    #[must_use]
    pub fn working_directory(&self) -> Option<&Path> {
        self.working_directory.as_deref()
    }

    /// Returns the configured execution budget, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Context used to open an engine session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    working_directory: PathBuf,
    initial_prompt: Option<String>,
}

impl SessionContext {
    /// Creates a context rooted at `working_directory`.
    #[must_use]
    pub fn new(working_directory: impl Into<PathBuf>) -> Self {
        Self {
            working_directory: working_directory.into(),
            initial_prompt: None,
        }
    }

    /// Sets a priming prompt executed as part of session start.
    #[must_use]
    pub fn with_initial_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.initial_prompt = Some(prompt.into());
        self
    }

    /// Returns the session working directory.
    #[must_use]
    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Returns the priming prompt, if any.
    #[must_use]
    pub fn initial_prompt(&self) -> Option<&str> {
        self.initial_prompt.as_deref()
    }
}
