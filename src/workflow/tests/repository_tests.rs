//! Contract tests for the in-memory workflow repository.

use crate::workflow::{
    adapters::memory::InMemoryWorkflowRepository,
    domain::{
        Artifact, ArtifactId, ArtifactType, NewArtifact, NewTask, Phase, Project, ProjectId, Run,
        RunId, Task, TaskId, TaskVersion,
    },
    ports::{ArtifactFilter, WorkflowRepository, WorkflowRepositoryError},
};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

#[fixture]
fn repository() -> InMemoryWorkflowRepository {
    InMemoryWorkflowRepository::new()
}

fn task(project_id: ProjectId, title: &str, priority: i32) -> Task {
    Task::new(
        NewTask {
            project_id,
            title: title.to_owned(),
            description: String::new(),
            priority,
            phase: None,
        },
        &DefaultClock,
    )
    .expect("valid task")
}

fn artifact(project_id: ProjectId, run_id: Option<RunId>, kind: ArtifactType) -> Artifact {
    let mut request = NewArtifact::new(project_id, kind, format!("{kind}.txt"));
    if let Some(id) = run_id {
        request = request.with_run(id);
    }
    Artifact::new(
        ArtifactId::new(),
        request,
        "/tmp/artifact",
        "00",
        0,
        &DefaultClock,
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn projects_round_trip(repository: InMemoryWorkflowRepository) {
    let project = Project::new("demo", "/work/demo", &DefaultClock).expect("valid project");

    repository
        .store_project(&project)
        .await
        .expect("store should succeed");
    let duplicate = repository.store_project(&project).await;

    assert_eq!(
        repository
            .find_project(project.id())
            .await
            .expect("lookup should succeed"),
        Some(project)
    );
    assert!(matches!(
        duplicate,
        Err(WorkflowRepositoryError::Duplicate {
            kind: "project",
            ..
        })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tasks_list_by_priority_within_a_project(repository: InMemoryWorkflowRepository) {
    let project_id = ProjectId::new();
    let low = task(project_id, "low", 1);
    let high = task(project_id, "high", 5);
    let foreign = task(ProjectId::new(), "foreign", 9);
    for stored in [&low, &high, &foreign] {
        repository
            .create_task(stored)
            .await
            .expect("create should succeed");
    }

    let listed = repository
        .list_tasks(project_id)
        .await
        .expect("list should succeed");

    let titles: Vec<&str> = listed.iter().map(Task::title).collect();
    assert_eq!(titles, vec!["high", "low"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn updating_unknown_records_fails(repository: InMemoryWorkflowRepository) {
    let missing_task = task(ProjectId::new(), "ghost", 0);
    let missing_run = Run::start(ProjectId::new(), None, Phase::Planner, "x", &DefaultClock);

    assert!(matches!(
        repository.update_task(&missing_task).await,
        Err(WorkflowRepositoryError::TaskNotFound(id)) if id == missing_task.id()
    ));
    assert!(matches!(
        repository.update_run(&missing_run).await,
        Err(WorkflowRepositoryError::RunNotFound(id)) if id == missing_run.id()
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn latest_version_is_the_highest_number(repository: InMemoryWorkflowRepository) {
    let stored = task(ProjectId::new(), "versioned", 0);
    repository
        .create_task(&stored)
        .await
        .expect("create should succeed");
    let second = TaskVersion::new(stored.id(), 2, "v2", "", &DefaultClock);
    let first = TaskVersion::new(stored.id(), 1, "v1", "", &DefaultClock);
    repository
        .create_task_version(&second)
        .await
        .expect("v2 should store");
    repository
        .create_task_version(&first)
        .await
        .expect("v1 should store");

    let history = repository
        .list_task_versions(stored.id())
        .await
        .expect("list should succeed");
    let latest = repository
        .get_latest_task_version(stored.id())
        .await
        .expect("lookup should succeed");
    let clash = repository
        .create_task_version(&TaskVersion::new(stored.id(), 2, "again", "", &DefaultClock))
        .await;

    assert_eq!(
        history.iter().map(TaskVersion::version).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(latest.map(|version| version.version()), Some(2));
    assert!(matches!(clash, Err(WorkflowRepositoryError::Duplicate { .. })));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn versions_require_an_existing_task(repository: InMemoryWorkflowRepository) {
    let orphan = TaskVersion::new(TaskId::new(), 1, "orphan", "", &DefaultClock);

    let result = repository.create_task_version(&orphan).await;

    assert!(matches!(result, Err(WorkflowRepositoryError::TaskNotFound(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn artifacts_filter_by_run_and_type(repository: InMemoryWorkflowRepository) {
    let project_id = ProjectId::new();
    let run_id = RunId::new();
    let plan = artifact(project_id, Some(run_id), ArtifactType::Plan);
    let transcript = artifact(project_id, Some(run_id), ArtifactType::Transcript);
    let unrelated = artifact(project_id, None, ArtifactType::Plan);
    for stored in [&plan, &transcript, &unrelated] {
        repository
            .create_artifact(stored)
            .await
            .expect("create should succeed");
    }

    let by_run = repository
        .list_artifacts(ArtifactFilter::for_run(run_id))
        .await
        .expect("list should succeed");
    let plans = repository
        .list_artifacts(ArtifactFilter::for_run(run_id).with_type(ArtifactType::Plan))
        .await
        .expect("list should succeed");

    assert_eq!(by_run.len(), 2);
    assert_eq!(plans, vec![plan]);
}
