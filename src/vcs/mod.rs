//! Version-control collaborator for committing gated coder output.
//!
//! The coder phase hands a passing task to a [`ports::CommitCollaborator`]
//! exactly once. The git adapter stages the whole working tree and writes a
//! structured commit message; the no-op adapter records nothing.

pub mod adapters;
pub mod ports;

#[cfg(test)]
mod tests;
