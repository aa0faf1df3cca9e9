//! Persisted output file records.

use super::{ArtifactId, ParseWorkflowValueError, ProjectId, RunId, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of persisted artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    /// Planner output (`plan.json`).
    Plan,
    /// Architect output (`architecture.json`).
    Architecture,
    /// Architecture decision record.
    Adr,
    /// Engine session transcript.
    Transcript,
    /// Source produced by the coder.
    Code,
    /// Patch or diff.
    Diff,
    /// Command or gate log.
    Log,
    /// Anything else.
    Other,
}

impl ArtifactType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Architecture => "architecture",
            Self::Adr => "adr",
            Self::Transcript => "transcript",
            Self::Code => "code",
            Self::Diff => "diff",
            Self::Log => "log",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ArtifactType {
    type Error = ParseWorkflowValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "plan" => Ok(Self::Plan),
            "architecture" => Ok(Self::Architecture),
            "adr" => Ok(Self::Adr),
            "transcript" => Ok(Self::Transcript),
            "code" => Ok(Self::Code),
            "diff" => Ok(Self::Diff),
            "log" => Ok(Self::Log),
            "other" => Ok(Self::Other),
            _ => Err(ParseWorkflowValueError::new("artifact type", value)),
        }
    }
}

/// Ownership and naming of an artifact about to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArtifact {
    /// Owning project.
    pub project_id: ProjectId,
    /// Task the artifact belongs to, if any.
    pub task_id: Option<TaskId>,
    /// Run that produced the artifact, if any.
    pub run_id: Option<RunId>,
    /// Artifact kind.
    pub artifact_type: ArtifactType,
    /// File name, e.g. `plan.json`.
    pub name: String,
}

impl NewArtifact {
    /// Creates a project-scoped request.
    #[must_use]
    pub fn new(project_id: ProjectId, artifact_type: ArtifactType, name: impl Into<String>) -> Self {
        Self {
            project_id,
            task_id: None,
            run_id: None,
            artifact_type,
            name: name.into(),
        }
    }

    /// Links the artifact to a task.
    #[must_use]
    pub const fn with_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Links the artifact to the run that produced it.
    #[must_use]
    pub const fn with_run(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }
}

/// A persisted file with content-hash provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    id: ArtifactId,
    project_id: ProjectId,
    task_id: Option<TaskId>,
    run_id: Option<RunId>,
    artifact_type: ArtifactType,
    name: String,
    storage_path: PathBuf,
    sha256: String,
    size_bytes: u64,
    created_at: DateTime<Utc>,
}

impl Artifact {
    /// Records a stored file under a pre-allocated identifier.
    #[must_use]
    pub fn new(
        id: ArtifactId,
        request: NewArtifact,
        storage_path: impl Into<PathBuf>,
        sha256: impl Into<String>,
        size_bytes: u64,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id,
            project_id: request.project_id,
            task_id: request.task_id,
            run_id: request.run_id,
            artifact_type: request.artifact_type,
            name: request.name,
            storage_path: storage_path.into(),
            sha256: sha256.into(),
            size_bytes,
            created_at: clock.utc(),
        }
    }

    /// Returns the artifact identifier.
    #[must_use]
    pub const fn id(&self) -> ArtifactId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the linked task.
    #[must_use]
    pub const fn task_id(&self) -> Option<TaskId> {
        self.task_id
    }

    /// Returns the producing run.
    #[must_use]
    pub const fn run_id(&self) -> Option<RunId> {
        self.run_id
    }

    /// Returns the artifact kind.
    #[must_use]
    pub const fn artifact_type(&self) -> ArtifactType {
        self.artifact_type
    }

    /// Returns the file name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns where the content is stored.
    #[must_use]
    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    /// Returns the lowercase hex SHA-256 of the content.
    #[must_use]
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Returns the content length in bytes.
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
