//! Then steps for coder gate scenarios.

use super::world::{CoderWorld, run_async};
use changeforge::orchestration::{domain::CoderOutcome, services::OrchestrationError};
use changeforge::workflow::domain::Task;
use eyre::WrapErr;
use rstest_bdd_macros::then;

fn stored_task(world: &CoderWorld) -> Result<Task, eyre::Report> {
    let task_id = world
        .task
        .as_ref()
        .map(Task::id)
        .ok_or_else(|| eyre::eyre!("missing task"))?;
    run_async(world.orchestrator.lifecycle().find_task(task_id))
        .wrap_err("look up task")?
        .ok_or_else(|| eyre::eyre!("task {task_id} is not stored"))
}

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &CoderWorld, status: String) -> Result<(), eyre::Report> {
    let task = stored_task(world)?;
    if task.status().as_str() != status {
        return Err(eyre::eyre!(
            "expected status {status}, found {}",
            task.status()
        ));
    }
    Ok(())
}

#[then("the commit count is {count:usize}")]
fn commit_count_is(world: &CoderWorld, count: usize) -> Result<(), eyre::Report> {
    let recorded = world.committer.count();
    if recorded != count {
        return Err(eyre::eyre!("expected {count} commits, found {recorded}"));
    }
    Ok(())
}

#[then("the attempt count is {count:u32}")]
fn attempt_count_is(world: &CoderWorld, count: u32) -> Result<(), eyre::Report> {
    let attempts = stored_task(world)?.attempts();
    if attempts != count {
        return Err(eyre::eyre!("expected {count} attempts, found {attempts}"));
    }
    Ok(())
}

#[then(r#"the run failed naming the gate "{gate}""#)]
fn run_failed_naming_gate(world: &CoderWorld, gate: String) -> Result<(), eyre::Report> {
    match world.outcome.as_ref() {
        Some(Ok(CoderOutcome::GatesFailed { run, report, .. })) => {
            let failed: Vec<&str> = report.failed_gate_names().collect();
            if !failed.contains(&gate.as_str()) {
                return Err(eyre::eyre!("gate {gate} not among failures {failed:?}"));
            }
            let error = run.error().unwrap_or_default();
            if !error.contains(&gate) {
                return Err(eyre::eyre!("run error {error:?} does not name {gate}"));
            }
            Ok(())
        }
        other => Err(eyre::eyre!("expected a gate failure, got {other:?}")),
    }
}

#[then("the coder phase is refused as not approved")]
fn refused_as_not_approved(world: &CoderWorld) -> Result<(), eyre::Report> {
    match world.outcome.as_ref() {
        Some(Err(OrchestrationError::NotApproved { .. })) => Ok(()),
        other => Err(eyre::eyre!("expected a not-approved refusal, got {other:?}")),
    }
}
