//! Tests for the git commit collaborator against throwaway repositories.

use crate::vcs::{
    adapters::{GitCommitter, NoopCommitter},
    ports::{CommitCollaborator, TaskCommitRequest},
};
use crate::workflow::domain::{Phase, TaskId};
use rstest::{fixture, rstest};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

fn init_repo(dir: &Path) {
    let status = Command::new("git")
        .args(["init", "-q"])
        .current_dir(dir)
        .status()
        .expect("git init should run");
    assert!(status.success(), "git init failed");
}

fn last_commit_message(dir: &Path) -> String {
    let output = Command::new("git")
        .args(["log", "-1", "--pretty=%B"])
        .current_dir(dir)
        .output()
        .expect("git log should run");
    String::from_utf8_lossy(&output.stdout).trim().to_owned()
}

#[fixture]
fn request() -> TaskCommitRequest {
    TaskCommitRequest {
        task_id: TaskId::new(),
        title: "Write greeting".to_owned(),
        phase: Phase::Coder,
        gate_report: None,
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn directories_without_a_repository_are_skipped(request: TaskCommitRequest) {
    if !git_available() {
        return;
    }
    let dir = TempDir::new().expect("temp dir");
    let committer = GitCommitter::new(dir.path());

    let result = committer
        .create_task_commit(request)
        .await
        .expect("missing repositories are not errors");

    assert_eq!(result, None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn changes_are_committed_with_the_structured_message(request: TaskCommitRequest) {
    if !git_available() {
        return;
    }
    let dir = TempDir::new().expect("temp dir");
    init_repo(dir.path());
    std::fs::write(dir.path().join("hello.txt"), "hello\n").expect("write file");
    let committer = GitCommitter::new(dir.path());
    let expected = request.message();

    let sha = committer
        .create_task_commit(request)
        .await
        .expect("commit should succeed");

    let Some(commit) = sha else {
        panic!("a commit id should be returned");
    };
    assert_eq!(commit.len(), 40);
    assert_eq!(last_commit_message(dir.path()), expected);
    assert!(
        !committer
            .has_changes()
            .await
            .expect("status should succeed")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn clean_trees_produce_no_commit(request: TaskCommitRequest) {
    if !git_available() {
        return;
    }
    let dir = TempDir::new().expect("temp dir");
    init_repo(dir.path());
    let committer = GitCommitter::new(dir.path());

    let result = committer
        .create_task_commit(request)
        .await
        .expect("clean trees are not errors");

    assert_eq!(result, None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn noop_committer_never_commits(request: TaskCommitRequest) {
    let result = NoopCommitter
        .create_task_commit(request)
        .await
        .expect("noop never fails");

    assert_eq!(result, None);
}
