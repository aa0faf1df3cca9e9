//! Planner phase behaviour.

use super::support::{ENGINE, Harness};
use crate::engine::adapters::ScriptedEngine;
use crate::engine::domain::EngineName;
use crate::events::domain::EventType;
use crate::orchestration::services::OrchestrationError;
use crate::workflow::{
    domain::{ArtifactType, Phase, ProjectId, RunStatus, TaskStatus},
    ports::{ArtifactFilter, WorkflowRepository},
};
use eyre::{ensure, eyre};
use rstest::rstest;
use serde_json::json;

const PLAN_REPLY: &str = r#"Here is the plan.
```json
{"tasks": [
  {"title": "Schema", "description": "tables", "priority": 2,
   "gates": [{"name": "tests", "command": "cargo test"}]},
  {"name": "API", "dependencies": ["Schema"]}
]}
```"#;

fn engine() -> ScriptedEngine {
    ScriptedEngine::new(EngineName::new(ENGINE).expect("engine name"))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn plan_creates_pending_tasks_and_artifacts() -> eyre::Result<()> {
    let harness = Harness::new(engine().with_reply("noted").with_reply(PLAN_REPLY)).await;

    let outcome = harness
        .orchestrator
        .run_planner_phase(harness.project.id(), "Build a ledger.", None)
        .await?;

    ensure!(outcome.is_success(), "planner run succeeds: {:?}", outcome.error);
    ensure!(!outcome.degraded, "plan decoded");
    ensure!(outcome.task_ids.len() == 2, "two tasks created");
    for id in &outcome.task_ids {
        let task = harness
            .repository
            .find_task(*id)
            .await?
            .ok_or_else(|| eyre!("task {id} missing"))?;
        ensure!(task.status() == TaskStatus::Pending, "tasks start pending");
        ensure!(task.current_phase() == Some(Phase::Planner), "tied to planner");
    }
    let first = outcome.task_ids.first().copied().ok_or_else(|| eyre!("no task"))?;
    let version = harness
        .repository
        .get_latest_task_version(first)
        .await?
        .ok_or_else(|| eyre!("no version"))?;
    ensure!(version.gates().len() == 1, "gates land on version 1");

    let artifacts = harness
        .repository
        .list_artifacts(ArtifactFilter::for_run(outcome.run.id()))
        .await?;
    let mut types: Vec<ArtifactType> = artifacts.iter().map(|a| a.artifact_type()).collect();
    types.sort_by_key(|kind| kind.as_str());
    ensure!(
        types == [ArtifactType::Log, ArtifactType::Plan, ArtifactType::Transcript],
        "plan stored beside its transcript and run log, got {types:?}"
    );

    let prompts = harness.engine.prompts();
    ensure!(prompts.len() == 2, "priming plus planner prompt");
    ensure!(
        prompts.first().is_some_and(|p| p.contains("Build a ledger.")),
        "session primed with the specification"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn prose_reply_yields_a_degraded_empty_plan() -> eyre::Result<()> {
    let reply = "I need more detail before planning.";
    let harness = Harness::new(engine().with_reply("ok").with_reply(reply)).await;

    let outcome = harness
        .orchestrator
        .run_planner_phase(harness.project.id(), "Vague idea", None)
        .await?;

    ensure!(outcome.is_success(), "a degraded plan is not a failure");
    ensure!(outcome.degraded, "flagged as degraded");
    ensure!(outcome.task_ids.is_empty(), "no tasks from prose");
    ensure!(
        outcome.document == json!({ "tasks": [], "raw_response": reply }),
        "raw response kept for follow-up"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unhealthy_engine_fails_the_run() -> eyre::Result<()> {
    let harness = Harness::new(engine().with_healthy(false)).await;

    let outcome = harness
        .orchestrator
        .run_planner_phase(harness.project.id(), "spec", None)
        .await?;

    ensure!(outcome.run.status() == RunStatus::Failure, "run failed");
    ensure!(
        outcome.error.as_deref().is_some_and(|e| e.contains("health check")),
        "error recorded"
    );
    let stored = harness
        .repository
        .find_run(outcome.run.id())
        .await?
        .ok_or_else(|| eyre!("run not persisted"))?;
    ensure!(stored.status() == RunStatus::Failure, "failure persisted");
    ensure!(
        harness.event_types().contains(&EventType::RunFailed),
        "run-failed published"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn execution_failure_is_recorded_on_the_run() -> eyre::Result<()> {
    let harness = Harness::new(engine().with_reply("ok").with_failure("rate limited")).await;

    let outcome = harness
        .orchestrator
        .run_planner_phase(harness.project.id(), "spec", None)
        .await?;

    ensure!(!outcome.is_success(), "run failed");
    ensure!(
        outcome.run.error().is_some_and(|e| e.contains("rate limited")),
        "engine error kept"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_project_is_rejected_before_any_run() {
    let harness = Harness::new(engine()).await;

    let result = harness
        .orchestrator
        .run_planner_phase(ProjectId::new(), "spec", None)
        .await;

    assert!(matches!(result, Err(OrchestrationError::NotFound { kind: "project", .. })));
    assert!(harness.event_types().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_engine_is_a_configuration_error() {
    let harness = Harness::new(engine()).await;

    let result = harness
        .orchestrator
        .run_planner_phase(harness.project.id(), "spec", Some("nonexistent"))
        .await;

    let err = result.expect_err("engine lookup should fail");
    assert!(err.is_configuration());
    assert!(harness.event_types().is_empty(), "no run was started");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn successful_plan_publishes_lifecycle_events() -> eyre::Result<()> {
    let harness = Harness::new(engine().with_reply("ok").with_reply(PLAN_REPLY)).await;

    harness
        .orchestrator
        .run_planner_phase(harness.project.id(), "spec", None)
        .await?;

    let types = harness.event_types();
    ensure!(types.first() == Some(&EventType::RunStarted), "run starts first");
    ensure!(
        types.iter().filter(|t| **t == EventType::TaskCreated).count() == 2,
        "one task-created per task"
    );
    ensure!(types.contains(&EventType::ArtifactCreated), "artifacts announced");
    ensure!(types.last() == Some(&EventType::PhaseCompleted), "phase completes last");
    Ok(())
}
