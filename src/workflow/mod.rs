//! Workflow records for the governed pipeline.
//!
//! Projects own tasks; each task carries an immutable version history whose
//! latest entry defines the active gate set. Every phase execution is one
//! [`domain::Run`], and every persisted output file is an
//! [`domain::Artifact`] linked back to its project, task, and run.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Lifecycle services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
