//! Git commit collaborator.

use crate::vcs::ports::{CommitCollaborator, TaskCommitRequest, VcsError, VcsResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{info, instrument};

const AUTHOR_NAME: &str = "changeforge";
const AUTHOR_EMAIL: &str = "changeforge@automated.local";

/// Commits task output with the `git` CLI in a working directory.
#[derive(Debug, Clone)]
pub struct GitCommitter {
    work_dir: PathBuf,
}

struct GitOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

impl GitCommitter {
    /// Creates a committer for the repository containing `work_dir`.
    #[must_use]
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    /// Returns the working directory.
    #[must_use]
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Returns `true` when the working directory is inside a git repository.
    pub async fn is_repo(&self) -> bool {
        self.git_unchecked(&["rev-parse", "--git-dir"])
            .await
            .is_ok_and(|output| output.success)
    }

    /// Returns `true` when the working tree has staged, unstaged, or
    /// untracked changes.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError`] when `git status` fails.
    pub async fn has_changes(&self) -> VcsResult<bool> {
        let status = self.git(&["status", "--porcelain"]).await?;
        Ok(!status.trim().is_empty())
    }

    async fn git(&self, args: &[&str]) -> VcsResult<String> {
        let output = self.git_unchecked(args).await?;
        if !output.success {
            return Err(VcsError::Command {
                command: command_line(args),
                stderr: output.stderr.trim().to_owned(),
            });
        }
        Ok(output.stdout.trim().to_owned())
    }

    async fn git_unchecked(&self, args: &[&str]) -> VcsResult<GitOutput> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|err| VcsError::Io {
                command: command_line(args),
                source: Arc::new(err),
            })?;
        Ok(GitOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

fn command_line(args: &[&str]) -> String {
    format!("git {}", args.join(" "))
}

#[async_trait]
impl CommitCollaborator for GitCommitter {
    #[instrument(skip(self, request), fields(task_id = %request.task_id))]
    async fn create_task_commit(&self, request: TaskCommitRequest) -> VcsResult<Option<String>> {
        if !self.is_repo().await {
            info!(dir = %self.work_dir.display(), "not a git repository, skipping commit");
            return Ok(None);
        }
        self.git(&["add", "-A"]).await?;
        if !self.has_changes().await? {
            info!("working tree clean, nothing to commit");
            return Ok(None);
        }

        let message = request.message();
        let author = format!("{AUTHOR_NAME} <{AUTHOR_EMAIL}>");
        let user_name = format!("user.name={AUTHOR_NAME}");
        let user_email = format!("user.email={AUTHOR_EMAIL}");
        self.git(&[
            "-c",
            &user_name,
            "-c",
            &user_email,
            "commit",
            "-m",
            &message,
            "--author",
            &author,
        ])
        .await?;
        let sha = self.git(&["rev-parse", "HEAD"]).await?;
        info!(commit = %sha, "task committed");
        Ok(Some(sha))
    }
}
