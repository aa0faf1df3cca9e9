//! Lifecycle events for observers of the pipeline.
//!
//! The orchestrator publishes an [`domain::Event`] whenever a task, run,
//! artifact, or phase changes. Publishing is fire-and-forget: a missing
//! audience never fails a phase.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
