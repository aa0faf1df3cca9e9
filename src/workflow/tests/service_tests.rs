//! Service tests for project, task, and review lifecycle operations.

use std::sync::Arc;

use crate::gate::domain::GateSpec;
use crate::workflow::{
    adapters::memory::InMemoryWorkflowRepository,
    domain::{Phase, Project, ProjectId, TaskStatus, WorkflowDomainError},
    services::{CreateTaskRequest, ReviseTaskRequest, TaskLifecycleError, TaskLifecycleService},
};
use eyre::{bail, ensure};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

type TestService = TaskLifecycleService<InMemoryWorkflowRepository, DefaultClock>;

#[fixture]
fn service() -> TestService {
    TaskLifecycleService::new(
        Arc::new(InMemoryWorkflowRepository::new()),
        Arc::new(DefaultClock),
    )
}

async fn project(service: &TestService) -> Project {
    service
        .create_project("demo", "/work/demo")
        .await
        .expect("project creation should succeed")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_task_records_version_one(service: TestService) -> eyre::Result<()> {
    let demo = project(&service).await;
    let gate = GateSpec::new("tests", "cargo test");

    let task = service
        .create_task(
            CreateTaskRequest::new(demo.id(), "Add login")
                .with_description("form and handler")
                .with_gates([gate.clone()])
                .with_dependencies(["auth".to_owned()]),
        )
        .await?;
    let versions = service.versions(task.id()).await?;

    ensure!(versions.len() == 1, "expected one version");
    let Some(first) = versions.first() else {
        bail!("missing version");
    };
    ensure!(first.version() == 1, "first version is 1");
    ensure!(first.gates() == [gate], "gates captured");
    ensure!(first.dependencies() == ["auth"], "dependencies captured");
    ensure!(first.description() == "form and handler", "description captured");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_task_requires_the_project(service: TestService) {
    let missing = ProjectId::new();

    let result = service
        .create_task(CreateTaskRequest::new(missing, "orphan"))
        .await;

    assert!(matches!(result, Err(TaskLifecycleError::ProjectNotFound(id)) if id == missing));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn revisions_carry_gates_forward(service: TestService) -> eyre::Result<()> {
    let demo = project(&service).await;
    let gate = GateSpec::new("lint", "cargo clippy");
    let task = service
        .create_task(CreateTaskRequest::new(demo.id(), "Refactor").with_gates([gate.clone()]))
        .await?;

    let revised = service
        .revise_task(task.id(), ReviseTaskRequest::new().with_title("Refactor parser"))
        .await?;
    let stored = service.find_task(task.id()).await?;

    ensure!(revised.version() == 2, "version bumped");
    ensure!(revised.gates() == [gate], "gates carried over");
    ensure!(revised.title() == "Refactor parser", "title replaced");
    ensure!(
        stored.map(|current| current.version()) == Some(2),
        "task version follows the history"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn review_flow_reaches_approved(service: TestService) -> eyre::Result<()> {
    let demo = project(&service).await;
    let task = service
        .create_task(CreateTaskRequest::new(demo.id(), "Review me"))
        .await?;

    let submitted = service.submit_for_review(task.id()).await?;
    let approved = service.approve(task.id()).await?;

    ensure!(submitted.previous == TaskStatus::Pending, "was pending");
    ensure!(
        submitted.task.current_phase() == Some(Phase::ReviewApproval),
        "submission enters review"
    );
    ensure!(approved.previous == TaskStatus::AwaitingApproval, "was awaiting");
    ensure!(approved.task.status() == TaskStatus::Approved, "now approved");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_tasks_cannot_be_approved(service: TestService) -> eyre::Result<()> {
    let demo = project(&service).await;
    let task = service
        .create_task(CreateTaskRequest::new(demo.id(), "Nope"))
        .await?;
    service.reject(task.id()).await?;

    let result = service.approve(task.id()).await;

    ensure!(
        matches!(
            result,
            Err(TaskLifecycleError::Domain(
                WorkflowDomainError::InvalidStatusTransition {
                    from: TaskStatus::Rejected,
                    to: TaskStatus::Approved,
                    ..
                }
            ))
        ),
        "unexpected result: {result:?}"
    );
    Ok(())
}
