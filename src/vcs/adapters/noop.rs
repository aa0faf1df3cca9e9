//! Commit collaborator that never commits.

use crate::vcs::ports::{CommitCollaborator, TaskCommitRequest, VcsResult};
use async_trait::async_trait;
use tracing::debug;

/// Accepts every request and reports that nothing was committed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCommitter;

#[async_trait]
impl CommitCollaborator for NoopCommitter {
    async fn create_task_commit(&self, request: TaskCommitRequest) -> VcsResult<Option<String>> {
        debug!(task_id = %request.task_id, "commit skipped");
        Ok(None)
    }
}
