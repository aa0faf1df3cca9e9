//! Project configuration read from `<root>/config.yaml`.
//!
//! Every section is optional; absent keys take the defaults below. The file
//! shape is:
//!
//! ```yaml
//! project_name: ledger
//! default_engine: copilot_cli
//! prompts_dir: prompts
//! sandbox:
//!   allowed_paths: ["src/**", "tests/**"]
//!   allowed_commands: [cargo, git, sh]
//!   blocked_commands: [curl]
//!   command_timeout: 300
//! gates:
//!   enabled: true
//!   timeout: 60
//!   fail_on_error: true
//!   env:
//!     CI: "1"
//! engine:
//!   timeout: 300
//! ```

use crate::engine::domain::COPILOT_CLI;
use crate::gate::domain::{DEFAULT_GATE_TIMEOUT_SECS, GateSpec};
use crate::orchestration::services::OrchestratorConfig;
use crate::sandbox::{CommandRunner, DEFAULT_ALLOWED_PATTERN, SafePathResolver, SandboxError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// File name looked up in the project root.
pub const CONFIG_FILE: &str = "config.yaml";

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Errors raised while loading configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Offending file.
        path: PathBuf,
        /// Underlying failure.
        source: Arc<io::Error>,
    },
    /// The file is not valid configuration YAML.
    #[error("failed to parse {path}: {reason}")]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },
    /// The sandbox settings are unusable.
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}

/// Sandbox policy for project paths and commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSettings {
    /// Glob patterns of reachable paths, relative to the root.
    pub allowed_paths: Vec<String>,
    /// Executables that may run; `None` leaves only the deny-set.
    pub allowed_commands: Option<Vec<String>>,
    /// Executables denied on top of the built-in deny-set.
    pub blocked_commands: Vec<String>,
    /// Default command budget in seconds.
    pub command_timeout: u64,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            allowed_paths: vec![DEFAULT_ALLOWED_PATTERN.to_owned()],
            allowed_commands: None,
            blocked_commands: Vec::new(),
            command_timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Gate execution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSettings {
    /// Whether the coder phase runs gates.
    pub enabled: bool,
    /// Upper bound in seconds for any single gate.
    pub timeout: u64,
    /// Whether a failing gate report is an error for callers such as
    /// `forge-gates`.
    pub fail_on_error: bool,
    /// Extra environment for gate commands.
    pub env: BTreeMap<String, String>,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: DEFAULT_GATE_TIMEOUT_SECS,
            fail_on_error: true,
            env: BTreeMap::new(),
        }
    }
}

impl GateSettings {
    /// Caps each spec's timeout at the configured bound.
    #[must_use]
    pub fn apply(&self, specs: Vec<GateSpec>) -> Vec<GateSpec> {
        specs
            .into_iter()
            .map(|spec| {
                let secs = spec.timeout().as_secs().min(self.timeout);
                spec.with_timeout_secs(secs)
            })
            .collect()
    }
}

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Per-prompt budget in seconds.
    pub timeout: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Per-project settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Display name; defaults to the root directory name on load.
    pub project_name: String,
    /// Engine used when a phase names none.
    pub default_engine: String,
    /// Directory of prompt templates, relative to the root.
    pub prompts_dir: Option<PathBuf>,
    /// Sandbox policy.
    pub sandbox: SandboxSettings,
    /// Gate settings.
    pub gates: GateSettings,
    /// Engine settings.
    pub engine: EngineSettings,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            default_engine: COPILOT_CLI.to_owned(),
            prompts_dir: None,
            sandbox: SandboxSettings::default(),
            gates: GateSettings::default(),
            engine: EngineSettings::default(),
        }
    }
}

impl ProjectConfig {
    /// Loads `<root>/config.yaml`, or the defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`] when the file
    /// exists but is unusable.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        let mut config = match std::fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text).map_err(|reason| ConfigError::Parse {
                path: path.clone(),
                reason,
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no project config; using defaults");
                Self::default()
            }
            Err(err) => {
                return Err(ConfigError::Read {
                    path,
                    source: Arc::new(err),
                });
            }
        };
        if config.project_name.trim().is_empty() {
            config.project_name = root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(config)
    }

    fn parse(text: &str) -> Result<Self, String> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|err| err.to_string())
    }

    /// Builds the path resolver for `root`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Sandbox`] when a path pattern is invalid.
    pub fn path_resolver(&self, root: &Path) -> Result<SafePathResolver, ConfigError> {
        Ok(SafePathResolver::new(root, &self.sandbox.allowed_paths)?)
    }

    /// Builds the command runner.
    #[must_use]
    pub fn command_runner(&self) -> CommandRunner {
        let mut runner = CommandRunner::new()
            .with_blocked_commands(self.sandbox.blocked_commands.iter().cloned())
            .with_default_timeout(Duration::from_secs(self.sandbox.command_timeout));
        if let Some(allowed) = &self.sandbox.allowed_commands {
            runner = runner.with_allowed_commands(allowed.iter().cloned());
        }
        runner
    }

    /// Builds the orchestrator settings.
    #[must_use]
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        self.gates.env.iter().fold(
            OrchestratorConfig::new()
                .with_default_engine(self.default_engine.clone())
                .with_engine_timeout(Duration::from_secs(self.engine.timeout))
                .with_gates_enabled(self.gates.enabled)
                .with_gate_timeout_secs(self.gates.timeout),
            |config, (key, value)| config.with_gate_env(key.clone(), value.clone()),
        )
    }

    /// Returns the prompt template directory resolved against `root`.
    #[must_use]
    pub fn prompts_dir(&self, root: &Path) -> Option<PathBuf> {
        self.prompts_dir.as_ref().map(|dir| root.join(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::{CONFIG_FILE, ConfigError, ProjectConfig};
    use crate::gate::domain::GateSpec;
    use rstest::rstest;
    use std::time::Duration;
    use tempfile::TempDir;

    fn root_with(config: Option<&str>) -> TempDir {
        let dir = TempDir::new().expect("temp dir");
        if let Some(text) = config {
            std::fs::write(dir.path().join(CONFIG_FILE), text).expect("write config");
        }
        dir
    }

    #[rstest]
    #[case::missing(None)]
    #[case::empty(Some("  \n"))]
    fn absent_settings_fall_back_to_defaults(#[case] config: Option<&str>) {
        let root = root_with(config);

        let loaded = ProjectConfig::load(root.path()).expect("load");

        assert_eq!(loaded.default_engine, "copilot_cli");
        assert_eq!(loaded.sandbox.command_timeout, 300);
        assert_eq!(loaded.sandbox.allowed_paths, ["**/*"]);
        assert!(loaded.gates.enabled);
        assert_eq!(loaded.gates.timeout, 60);
        assert!(!loaded.project_name.is_empty(), "named after the root");
    }

    #[rstest]
    fn partial_files_merge_with_defaults() {
        let root = root_with(Some(
            "project_name: ledger\nsandbox:\n  allowed_commands: [cargo]\n  command_timeout: 30\ngates:\n  enabled: false\n  env:\n    CI: \"1\"\n",
        ));

        let loaded = ProjectConfig::load(root.path()).expect("load");

        assert_eq!(loaded.project_name, "ledger");
        assert_eq!(loaded.sandbox.command_timeout, 30);
        assert!(loaded.sandbox.blocked_commands.is_empty());
        assert_eq!(loaded.engine.timeout, 300);

        let runner = loaded.command_runner();
        assert!(runner.is_allowed("cargo test"));
        assert!(!runner.is_allowed("python3 -V"));
        assert_eq!(runner.default_timeout(), Duration::from_secs(30));

        let orchestrator = loaded.orchestrator_config();
        assert!(!orchestrator.gates_enabled());
        assert_eq!(
            orchestrator.gate_env().get("CI").map(String::as_str),
            Some("1")
        );
        assert_eq!(orchestrator.gate_timeout_secs(), Some(60));
    }

    #[rstest]
    fn blocked_commands_extend_the_builtin_deny_set() {
        let root = root_with(Some("sandbox:\n  blocked_commands: [curl]\n"));

        let runner = ProjectConfig::load(root.path())
            .expect("load")
            .command_runner();

        assert!(!runner.is_allowed("curl example.com"));
        assert!(!runner.is_allowed("rm -rf /"));
        assert!(runner.is_allowed("ls"));
    }

    #[rstest]
    fn malformed_yaml_is_a_parse_error() {
        let root = root_with(Some("sandbox: [unclosed"));

        let result = ProjectConfig::load(root.path());

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[rstest]
    fn gate_timeouts_are_capped() {
        let root = root_with(Some("gates:\n  timeout: 10\n"));
        let loaded = ProjectConfig::load(root.path()).expect("load");

        let capped = loaded.gates.apply(vec![
            GateSpec::new("slow", "sleep 1").with_timeout_secs(120),
            GateSpec::new("fast", "true").with_timeout_secs(5),
        ]);

        let timeouts: Vec<u64> = capped.iter().map(|spec| spec.timeout().as_secs()).collect();
        assert_eq!(timeouts, [10, 5]);
    }

    #[rstest]
    fn resolver_uses_the_configured_patterns() {
        let root = root_with(Some("sandbox:\n  allowed_paths: [\"src/**\"]\n"));
        let loaded = ProjectConfig::load(root.path()).expect("load");

        let resolver = loaded.path_resolver(root.path()).expect("resolver");

        assert!(resolver.is_safe("src/lib.rs"));
        assert!(!resolver.is_safe("secrets.env"));
    }
}
