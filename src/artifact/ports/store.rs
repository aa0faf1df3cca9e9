//! Artifact storage port.

use crate::workflow::{
    domain::{Artifact, ArtifactId, NewArtifact},
    ports::WorkflowRepositoryError,
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Result type for artifact storage operations.
pub type ArtifactStoreResult<T> = Result<T, ArtifactStoreError>;

/// Durable storage for phase outputs.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persists `content` and records it as an artifact.
    ///
    /// The digest covers the full content and is computed before anything
    /// is written.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStoreError::InvalidName`] for names that are not a
    /// single file name, [`ArtifactStoreError::Io`] when writing fails, and
    /// [`ArtifactStoreError::Repository`] when the record cannot be stored.
    async fn store(&self, request: NewArtifact, content: &[u8])
    -> ArtifactStoreResult<Artifact>;

    /// Returns the artifact record and the path of its content.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStoreError::NotFound`] when no record exists and
    /// [`ArtifactStoreError::FileMissing`] when the content has vanished.
    async fn retrieve(&self, id: ArtifactId) -> ArtifactStoreResult<(Artifact, PathBuf)>;

    /// Re-hashes the stored content and compares it with the recorded
    /// SHA-256 digest. Missing content does not verify.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStoreError::NotFound`] when no record exists and
    /// [`ArtifactStoreError::Io`] when the content cannot be read.
    async fn verify(&self, id: ArtifactId) -> ArtifactStoreResult<bool>;
}

/// Errors returned by artifact stores.
#[derive(Debug, Clone, Error)]
pub enum ArtifactStoreError {
    /// No artifact record has the identifier.
    #[error("artifact not found: {0}")]
    NotFound(ArtifactId),

    /// The record exists but its content file does not.
    #[error("artifact {id} content missing at {}", path.display())]
    FileMissing {
        /// Artifact identifier.
        id: ArtifactId,
        /// Expected content location.
        path: PathBuf,
    },

    /// The artifact name is not a plain file name.
    #[error("invalid artifact name: '{0}'")]
    InvalidName(String),

    /// Reading or writing content failed.
    #[error("{context}: {source}")]
    Io {
        /// What was being attempted.
        context: String,
        /// Underlying failure.
        source: Arc<std::io::Error>,
    },

    /// The artifact record could not be persisted or read.
    #[error(transparent)]
    Repository(#[from] WorkflowRepositoryError),
}

impl ArtifactStoreError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source: Arc::new(source),
        }
    }
}
