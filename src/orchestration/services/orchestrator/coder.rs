//! Coder phase: implement an approved task and gate the result.

use super::{Orchestrator, PhaseFailure, execute_prompt, open_session};
use crate::artifact::ports::ArtifactStore;
use crate::engine::ports::EngineAdapter;
use crate::events::domain::EventType;
use crate::gate::domain::{GateRunReport, GateSpec};
use crate::orchestration::domain::CoderOutcome;
use crate::orchestration::services::{OrchestrationError, OrchestrationResult};
use crate::vcs::ports::TaskCommitRequest;
use crate::workflow::{
    domain::{ArtifactType, Phase, Project, Run, Task, TaskId, TaskStatus, TaskVersion},
    ports::WorkflowRepository,
};
use mockable::Clock;
use serde_json::{Map, Value, json};
use tracing::{info, instrument, warn};

impl<R, S, C> Orchestrator<R, S, C>
where
    R: WorkflowRepository,
    S: ArtifactStore,
    C: Clock + Send + Sync,
{
    /// Drives the engine to implement an approved task, then runs its gates.
    ///
    /// Every invocation counts as an attempt, including ones whose engine
    /// fails. When all gates of the latest task version pass, the change is
    /// committed once and the task is completed; otherwise the task stays
    /// approved for another attempt.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::NotApproved`] without creating a run
    /// unless the task is approved, and other
    /// [`OrchestrationError`] variants when the task or project is unknown,
    /// the engine cannot be resolved, the prompt fails to render, or
    /// persistence fails.
    #[instrument(skip(self), fields(task_id = %task_id, run_id = tracing::field::Empty))]
    pub async fn run_coder_phase(
        &self,
        task_id: TaskId,
        engine_name: Option<&str>,
    ) -> OrchestrationResult<CoderOutcome> {
        let mut task = self.load_task(task_id).await?;
        if task.status() != TaskStatus::Approved {
            return Err(OrchestrationError::NotApproved {
                task_id,
                status: task.status(),
            });
        }
        let project = self.load_project(task.project_id()).await?;
        let name = self.engine_name(engine_name);
        let engine = self.resolve_engine(name, project.root())?;

        let versions = self.repository.list_task_versions(task_id).await?;
        let gates = versions
            .iter()
            .max_by_key(|version| version.version())
            .map(|version| version.gates().to_vec())
            .unwrap_or_default();
        let next_attempt = task.attempts().saturating_add(1);
        let prompt = self
            .prompts
            .render_coder(coder_context(&task, next_attempt, &versions, &gates))?;

        let attempt = task.record_attempt(&*self.clock);
        self.repository.update_task(&task).await?;
        let mut run = self
            .start_run(project.id(), Some(task_id), Phase::Coder, name)
            .await?;

        let report = match self
            .implement(&project, &mut run, engine.as_ref(), &prompt, &gates)
            .await
        {
            Ok(report) => report,
            Err(failure) => {
                let error = self.abort_run(&mut run, engine.as_ref(), &failure).await?;
                return Ok(CoderOutcome::ExecutionFailed {
                    run,
                    error,
                    attempt,
                });
            }
        };

        if !report.all_passed() {
            info!(
                run_id = %run.id(),
                attempt,
                passed = report.summary.passed,
                total = report.summary.total,
                "gates failed; task stays approved"
            );
            run.complete_with_gates(report.clone(), &*self.clock)?;
            self.record_run(&run).await?;
            return Ok(CoderOutcome::GatesFailed {
                run,
                report,
                attempt,
            });
        }

        let commit = self.commit(&task, &report).await;
        task.transition_to(TaskStatus::Completed, &*self.clock)?;
        task.enter_phase(Phase::Coder, &*self.clock);
        self.repository.update_task(&task).await?;
        self.publish(
            self.event(EventType::TaskStatusChanged)
                .with_project(task.project_id())
                .with_task(task_id)
                .with_run(run.id())
                .with_data("from", TaskStatus::Approved.as_str())
                .with_data("to", task.status().as_str()),
        );

        run.complete_with_gates(report.clone(), &*self.clock)?;
        self.record_run(&run).await?;
        self.phase_completed(&run);
        Ok(CoderOutcome::Completed {
            run,
            report,
            commit,
            attempt,
        })
    }

    /// Runs the engine and the gates; the transcript is kept either way.
    ///
    /// A report that cannot be stored is still attached to `run`.
    async fn implement(
        &self,
        project: &Project,
        run: &mut Run,
        engine: &dyn EngineAdapter,
        prompt: &str,
        gates: &[GateSpec],
    ) -> Result<GateRunReport, PhaseFailure> {
        open_session(engine, project.root(), None).await?;
        let reply = execute_prompt(engine, prompt).await;
        self.store_transcript(run, engine).await?;
        reply?;
        engine.stop_session().await;

        let results = if self.config.gates_enabled() {
            let capped = self.config.cap_gates(gates);
            self.gates
                .run_gates(&capped, Some(project.root()), self.config.gate_env(), false)
                .await
        } else {
            warn!(run_id = %run.id(), "gates disabled; accepting engine result");
            Vec::new()
        };
        let report = GateRunReport::new(results);
        if let Err(failure) = self
            .store_json(run, ArtifactType::Log, "gate-report.json", &report)
            .await
        {
            run.attach_gate_report(report)?;
            return Err(failure);
        }
        Ok(report)
    }

    async fn commit(&self, task: &Task, report: &GateRunReport) -> Option<String> {
        let request = TaskCommitRequest {
            task_id: task.id(),
            title: task.title().to_owned(),
            phase: Phase::Coder,
            gate_report: Some(report.clone()),
        };
        self.committer
            .create_task_commit(request)
            .await
            .unwrap_or_else(|err| {
                warn!(task_id = %task.id(), error = %err, "commit failed; continuing");
                None
            })
    }
}

fn coder_context(
    task: &Task,
    attempt: u32,
    versions: &[TaskVersion],
    gates: &[GateSpec],
) -> Map<String, Value> {
    let history: Vec<Value> = versions
        .iter()
        .map(|version| json!({ "version": version.version(), "title": version.title() }))
        .collect();
    let gate_list: Vec<Value> = gates
        .iter()
        .map(|gate| json!({ "name": gate.name(), "command": gate.command() }))
        .collect();

    let mut context = Map::new();
    context.insert("task_title".to_owned(), Value::from(task.title()));
    context.insert(
        "task_description".to_owned(),
        Value::from(task.description()),
    );
    context.insert("attempt".to_owned(), Value::from(attempt));
    context.insert("history".to_owned(), Value::Array(history));
    context.insert("gates".to_owned(), Value::Array(gate_list));
    context
}
