//! Adapter implementations of the artifact storage port.

pub mod fs;

pub use fs::FsArtifactStore;
