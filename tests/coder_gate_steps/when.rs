//! When steps for coder gate scenarios.

use super::world::{CoderWorld, run_async};
use rstest_bdd_macros::when;

#[when("the coder phase runs")]
fn coder_phase_runs(world: &mut CoderWorld) -> Result<(), eyre::Report> {
    let task_id = world
        .task
        .as_ref()
        .map(changeforge::workflow::domain::Task::id)
        .ok_or_else(|| eyre::eyre!("missing task"))?;
    let outcome = run_async(world.orchestrator.run_coder_phase(task_id, None));
    world.outcome = Some(outcome);
    Ok(())
}
