//! Domain model for projects, tasks, runs, and artifacts.
//!
//! Aggregates keep their fields private and mutate only through methods that
//! uphold the lifecycle rules: validated status transitions, monotonic
//! versions and attempts, and runs that freeze once completed.

mod artifact;
mod error;
mod ids;
mod project;
mod run;
mod task;
mod version;

pub use artifact::{Artifact, ArtifactType, NewArtifact};
pub use error::{ParseWorkflowValueError, WorkflowDomainError};
pub use ids::{ArtifactId, ProjectId, RunId, TaskId, TaskVersionId};
pub use project::Project;
pub use run::{Run, RunStatus};
pub use task::{NewTask, Phase, PersistedTaskData, Task, TaskStatus};
pub use version::TaskVersion;
