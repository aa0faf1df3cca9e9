//! Governed phase pipeline: planner, architect, review, and coder.
//!
//! The [`services::Orchestrator`] sequences phases, drives engine sessions,
//! turns free-text responses into structured data, persists artifacts, runs
//! gates, and decides between commit and retry. Every phase execution is one
//! [`crate::workflow::domain::Run`]; preconditions and configuration problems
//! are returned as [`services::OrchestrationError`], while execution failures
//! are recorded on the run and reported in the outcome.
//!
//! - Response parsing and outcomes in [`domain`]
//! - The orchestrator, its configuration, and prompts in [`services`]

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
