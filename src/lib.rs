//! Changeforge: a governed pipeline for AI-assisted change.
//!
//! A project specification is planned into tasks, each task is designed,
//! reviewed and approved by a human, and only then implemented by an AI
//! engine. The implementation is accepted and committed only when every
//! validation gate passes; otherwise the task stays approved for a retry.
//!
//! # Architecture
//!
//! Changeforge follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (processes, files, git)
//!
//! # Modules
//!
//! - [`sandbox`]: Path confinement and policy-checked command execution
//! - [`engine`]: AI engine sessions, adapters, and the engine registry
//! - [`gate`]: Command-based validation checks and their reports
//! - [`workflow`]: Projects, tasks, versions, runs, and artifact records
//! - [`artifact`]: Content-addressed artifact storage
//! - [`events`]: Pipeline event publishing
//! - [`vcs`]: Commits for accepted task output
//! - [`orchestration`]: The planner, architect, review, and coder phases
//! - [`config`]: Per-project configuration
//! - [`logging`]: Subscriber setup for binaries

pub mod artifact;
pub mod config;
pub mod engine;
pub mod events;
pub mod gate;
pub mod logging;
pub mod orchestration;
pub mod sandbox;
pub mod vcs;
pub mod workflow;

mod process;
