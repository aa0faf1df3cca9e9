//! Runs a gate file against a project and prints the report as JSON.
//!
//! Usage:
//!
//! ```text
//! forge-gates [--root <dir>] [--stop-on-failure] <gates.json>
//! ```
//!
//! The gate file holds either a list of gate specs or `{"gates": [...]}`:
//!
//! ```json
//! [
//!   {"name": "tests", "command": "cargo test", "pass_criteria": "exit_code_0"},
//!   {"name": "coverage", "command": "cargo llvm-cov --summary-only",
//!    "pass_criteria": "output_matches", "expected_output": "TOTAL\\s+9\\d"}
//! ]
//! ```
//!
//! Sandbox policy and gate limits come from `<root>/config.yaml`. The exit
//! status is non-zero when a gate fails and `gates.fail_on_error` is set.

use camino::{Utf8Path, Utf8PathBuf};
use changeforge::config::{ConfigError, ProjectConfig};
use changeforge::gate::{
    domain::{GateRunReport, GateSpec},
    services::GateRunner,
};
use changeforge::logging;
use clap::Parser;
use mockable::DefaultClock;
use serde::Deserialize;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Builder;
use tracing::info;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Parser)]
#[command(name = "forge-gates", about = "Run project gates and report the results")]
struct Cli {
    /// Project root; gates run here.
    #[arg(long, default_value = ".")]
    root: Utf8PathBuf,
    /// Stop after the first failing gate.
    #[arg(long)]
    stop_on_failure: bool,
    /// JSON file of gate specs.
    gates: Utf8PathBuf,
}

#[derive(Debug, Error)]
enum GatesError {
    #[error("logging setup failed: {0}")]
    Logging(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read gate file {path}: {source}")]
    GateFileRead {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse gate file {path}: {source}")]
    GateFileParse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] io::Error),
    #[error("failed to write report: {0}")]
    Output(#[source] io::Error),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GateFile {
    List(Vec<GateSpec>),
    Wrapped { gates: Vec<GateSpec> },
}

impl GateFile {
    fn into_specs(self) -> Vec<GateSpec> {
        match self {
            Self::List(gates) | Self::Wrapped { gates } => gates,
        }
    }
}

fn main() -> Result<ExitCode, BoxError> {
    let cli = Cli::parse();
    Ok(run(&cli)?)
}

fn run(cli: &Cli) -> Result<ExitCode, GatesError> {
    logging::init().map_err(|err| GatesError::Logging(err.to_string()))?;
    let root = cli.root.as_std_path();
    let config = ProjectConfig::load(root)?;
    let specs = config.gates.apply(load_gates(&cli.gates)?);
    info!(project = %config.project_name, gates = specs.len(), "running gates");

    let runner = GateRunner::new(Arc::new(config.command_runner()), Arc::new(DefaultClock));
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(GatesError::RuntimeInit)?;
    let results = runtime.block_on(runner.run_gates(
        &specs,
        Some(root),
        &config.gates.env,
        cli.stop_on_failure,
    ));
    let report = GateRunReport::new(results);

    let rendered = serde_json::to_string_pretty(&report).map_err(|err| {
        GatesError::Output(io::Error::new(io::ErrorKind::InvalidData, err))
    })?;
    writeln!(io::stdout().lock(), "{rendered}").map_err(GatesError::Output)?;

    if report.all_passed() || !config.gates.fail_on_error {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn load_gates(path: &Utf8Path) -> Result<Vec<GateSpec>, GatesError> {
    let text = std::fs::read_to_string(path).map_err(|source| GatesError::GateFileRead {
        path: path.to_owned(),
        source,
    })?;
    let file: GateFile =
        serde_json::from_str(&text).map_err(|source| GatesError::GateFileParse {
            path: path.to_owned(),
            source,
        })?;
    Ok(file.into_specs())
}
