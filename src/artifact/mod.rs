//! Content-hashed artifact storage.
//!
//! Phase outputs (plans, architecture notes, decision records, transcripts)
//! are written to durable storage and recorded as
//! [`crate::workflow::domain::Artifact`] rows carrying their SHA-256 digest,
//! size, and location.
//!
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod ports;

#[cfg(test)]
mod tests;
