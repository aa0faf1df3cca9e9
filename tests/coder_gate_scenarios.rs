//! Behaviour tests for gate enforcement in the coder phase.

#[path = "coder_gate_steps/mod.rs"]
mod coder_gate_steps_defs;

use coder_gate_steps_defs::world::{CoderWorld, world};
use rstest_bdd_macros::scenario;

#[scenario(
    path = "tests/features/coder_gates.feature",
    name = "Passing gates complete and commit the task"
)]
#[tokio::test(flavor = "multi_thread")]
async fn passing_gates_complete_and_commit(world: CoderWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/coder_gates.feature",
    name = "Coverage output is judged by exit code"
)]
#[tokio::test(flavor = "multi_thread")]
async fn coverage_output_judged_by_exit_code(world: CoderWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/coder_gates.feature",
    name = "A failing gate keeps the task approved"
)]
#[tokio::test(flavor = "multi_thread")]
async fn failing_gate_keeps_task_approved(world: CoderWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/coder_gates.feature",
    name = "Unapproved tasks are refused before any run"
)]
#[tokio::test(flavor = "multi_thread")]
async fn unapproved_tasks_are_refused(world: CoderWorld) {
    let _ = world;
}
