//! Engine adapters over pluggable AI-assistant processes.
//!
//! An engine receives free-text prompts inside a session and answers with
//! free text. Every adapter implements [`ports::EngineAdapter`] and keeps an
//! append-only transcript of the session. Failures at this boundary are
//! reported as failed [`domain::EngineResponse`] values rather than errors so
//! the orchestration layer can record them on the run.
//!
//! Adapters are constructed by name through the injected
//! [`services::EngineRegistry`].
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Registry service in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
