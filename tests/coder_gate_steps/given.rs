//! Given steps for coder gate scenarios.

use super::world::{CoderWorld, run_async};
use changeforge::engine::adapters::ScriptedReply;
use changeforge::gate::domain::GateSpec;
use changeforge::workflow::{domain::Task, services::CreateTaskRequest};
use eyre::WrapErr;
use rstest_bdd_macros::given;

fn create_task(world: &mut CoderWorld, name: &str, command: &str) -> Result<(), eyre::Report> {
    let lifecycle = world.orchestrator.lifecycle();
    let project = run_async(lifecycle.create_project("gated", world.root.path()))
        .wrap_err("create project")?;
    let request = CreateTaskRequest::new(project.id(), "Gated change")
        .with_description("Change guarded by a gate")
        .with_gates([GateSpec::new(name, command)]);
    let task = run_async(lifecycle.create_task(request)).wrap_err("create task")?;
    world.project = Some(project);
    world.task = Some(task);
    Ok(())
}

#[given(r#"a pending task with the gate "{name}" running "{command}""#)]
fn pending_task(world: &mut CoderWorld, name: String, command: String) -> Result<(), eyre::Report> {
    create_task(world, &name, &command)
}

#[given(r#"an approved task with the gate "{name}" running "{command}""#)]
fn approved_task(
    world: &mut CoderWorld,
    name: String,
    command: String,
) -> Result<(), eyre::Report> {
    create_task(world, &name, &command)?;
    let task_id = world
        .task
        .as_ref()
        .map(Task::id)
        .ok_or_else(|| eyre::eyre!("missing task"))?;
    let approved = run_async(world.orchestrator.approve_task(task_id)).wrap_err("approve task")?;
    world.task = Some(approved);
    Ok(())
}

#[given(r#"the engine replies "{reply}""#)]
fn engine_replies(world: &mut CoderWorld, reply: String) {
    world.engine.push(ScriptedReply::Text(reply));
}
