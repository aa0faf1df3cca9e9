//! Port contracts for artifact storage.

pub mod store;

pub use store::{ArtifactStore, ArtifactStoreError, ArtifactStoreResult};
