//! Project records.

use super::{ProjectId, WorkflowDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A codebase the pipeline works on.
///
/// The root is the working directory for engine sessions and gate commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    name: String,
    root: PathBuf,
    created_at: DateTime<Utc>,
}

impl Project {
    /// Creates a project rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::EmptyProjectName`] when the name is
    /// blank.
    pub fn new(
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        clock: &impl Clock,
    ) -> Result<Self, WorkflowDomainError> {
        let raw: String = name.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(WorkflowDomainError::EmptyProjectName);
        }
        Ok(Self {
            id: ProjectId::new(),
            name: trimmed.to_owned(),
            root: root.into(),
            created_at: clock.utc(),
        })
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn id(&self) -> ProjectId {
        self.id
    }

    /// Returns the project name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the project root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
