//! Filesystem artifact store.

use crate::artifact::ports::{ArtifactStore, ArtifactStoreError, ArtifactStoreResult};
use crate::workflow::{
    domain::{Artifact, ArtifactId, NewArtifact, ProjectId},
    ports::WorkflowRepository,
};
use async_trait::async_trait;
use mockable::Clock;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Stores artifact content under
/// `<base>/project_<project id>/artifact_<artifact id>/<name>` and records
/// it through the workflow repository.
#[derive(Clone)]
pub struct FsArtifactStore<R, C>
where
    R: WorkflowRepository,
    C: Clock + Send + Sync,
{
    base_dir: PathBuf,
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> FsArtifactStore<R, C>
where
    R: WorkflowRepository,
    C: Clock + Send + Sync,
{
    /// Creates a store rooted at `base_dir`.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>, repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            base_dir: base_dir.into(),
            repository,
            clock,
        }
    }

    /// Returns the storage root.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Reads an artifact's content.
    ///
    /// # Errors
    ///
    /// Returns the [`ArtifactStore::retrieve`] errors, or
    /// [`ArtifactStoreError::Io`] when reading fails.
    pub async fn read(&self, id: ArtifactId) -> ArtifactStoreResult<Vec<u8>> {
        let (_, path) = self.retrieve(id).await?;
        tokio::fs::read(&path)
            .await
            .map_err(|err| ArtifactStoreError::io(format!("reading {}", path.display()), err))
    }

    /// Removes an artifact's content and its directory. The record is kept.
    ///
    /// Returns `false` when the content was already gone.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStoreError::NotFound`] when no record exists and
    /// [`ArtifactStoreError::Io`] when removal fails.
    pub async fn delete_content(&self, id: ArtifactId) -> ArtifactStoreResult<bool> {
        let artifact = self.find(id).await?;
        let path = artifact.storage_path();
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
            Err(err) => {
                return Err(ArtifactStoreError::io(
                    format!("removing {}", path.display()),
                    err,
                ));
            }
        }
        if let Some(dir) = path.parent()
            && let Err(err) = tokio::fs::remove_dir(dir).await
        {
            debug!(dir = %dir.display(), error = %err, "artifact directory kept");
        }
        debug!(artifact_id = %id, "artifact content deleted");
        Ok(true)
    }

    /// Removes every stored file of a project and returns how many there
    /// were.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStoreError::Io`] when listing or removal fails.
    pub async fn cleanup_project(&self, project_id: ProjectId) -> ArtifactStoreResult<usize> {
        let dir = self.base_dir.join(format!("project_{project_id}"));
        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            return Ok(0);
        }
        let removed = count_files(&dir).await?;
        tokio::fs::remove_dir_all(&dir)
            .await
            .map_err(|err| ArtifactStoreError::io(format!("removing {}", dir.display()), err))?;
        debug!(project_id = %project_id, removed, "project artifacts removed");
        Ok(removed)
    }

    async fn find(&self, id: ArtifactId) -> ArtifactStoreResult<Artifact> {
        self.repository
            .find_artifact(id)
            .await?
            .ok_or(ArtifactStoreError::NotFound(id))
    }
}

fn listing_error(dir: &Path, err: std::io::Error) -> ArtifactStoreError {
    ArtifactStoreError::io(format!("listing {}", dir.display()), err)
}

async fn count_files(root: &Path) -> ArtifactStoreResult<usize> {
    let mut pending = vec![root.to_path_buf()];
    let mut count = 0_usize;
    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|err| listing_error(&dir, err))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| listing_error(&dir, err))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|err| listing_error(&dir, err))?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else {
                count = count.saturating_add(1);
            }
        }
    }
    Ok(count)
}

fn validate_name(name: &str) -> ArtifactStoreResult<&str> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        _ => Err(ArtifactStoreError::InvalidName(name.to_owned())),
    }
}

#[async_trait]
impl<R, C> ArtifactStore for FsArtifactStore<R, C>
where
    R: WorkflowRepository,
    C: Clock + Send + Sync,
{
    async fn store(
        &self,
        request: NewArtifact,
        content: &[u8],
    ) -> ArtifactStoreResult<Artifact> {
        let file_name = validate_name(&request.name)?.to_owned();
        let digest = format!("{:x}", Sha256::digest(content));
        let id = ArtifactId::new();
        let dir = self
            .base_dir
            .join(format!("project_{}", request.project_id))
            .join(format!("artifact_{id}"));
        let path = dir.join(&file_name);

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|err| ArtifactStoreError::io(format!("creating {}", dir.display()), err))?;
        if let Err(err) = tokio::fs::write(&path, content).await {
            discard(&dir).await;
            return Err(ArtifactStoreError::io(
                format!("writing {}", path.display()),
                err,
            ));
        }

        let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
        let artifact = Artifact::new(id, request, path, digest, size, &*self.clock);
        if let Err(err) = self.repository.create_artifact(&artifact).await {
            discard(&dir).await;
            return Err(err.into());
        }
        debug!(
            artifact_id = %artifact.id(),
            name = artifact.name(),
            sha256 = artifact.sha256(),
            size_bytes = artifact.size_bytes(),
            "artifact stored"
        );
        Ok(artifact)
    }

    async fn retrieve(&self, id: ArtifactId) -> ArtifactStoreResult<(Artifact, PathBuf)> {
        let artifact = self.find(id).await?;
        let path = artifact.storage_path().to_path_buf();
        let exists = tokio::fs::try_exists(&path).await.unwrap_or(false);
        if !exists {
            return Err(ArtifactStoreError::FileMissing { id, path });
        }
        Ok((artifact, path))
    }

    async fn verify(&self, id: ArtifactId) -> ArtifactStoreResult<bool> {
        let artifact = self.find(id).await?;
        let path = artifact.storage_path();
        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
            Err(err) => {
                return Err(ArtifactStoreError::io(
                    format!("reading {}", path.display()),
                    err,
                ));
            }
        };
        let digest = format!("{:x}", Sha256::digest(&content));
        let intact = digest == artifact.sha256();
        if !intact {
            warn!(
                artifact_id = %id,
                expected = artifact.sha256(),
                actual = %digest,
                "artifact digest mismatch"
            );
        }
        Ok(intact)
    }
}

async fn discard(dir: &Path) {
    if let Err(err) = tokio::fs::remove_dir_all(dir).await {
        warn!(dir = %dir.display(), error = %err, "failed to remove partial artifact");
    }
}
