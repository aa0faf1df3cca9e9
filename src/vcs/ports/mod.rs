//! Port contracts for version control.

pub mod committer;

pub use committer::{CommitCollaborator, TaskCommitRequest, VcsError, VcsResult};

#[cfg(test)]
pub use committer::MockCommitCollaborator;
