//! Commit collaborator adapters.

pub mod git;
pub mod noop;

pub use git::GitCommitter;
pub use noop::NoopCommitter;
