//! Port contracts for workflow persistence.
//!
//! The pipeline reads and writes every workflow record through these
//! infrastructure-agnostic interfaces.

pub mod repository;

pub use repository::{
    ArtifactFilter, WorkflowRepository, WorkflowRepositoryError, WorkflowRepositoryResult,
};
