//! Architect phase: design options and decision records for one task.

use super::{Orchestrator, PhaseFailure, PhaseProducts, execute_prompt, open_session};
use crate::artifact::ports::ArtifactStore;
use crate::engine::ports::EngineAdapter;
use crate::orchestration::domain::{PhaseOutcome, extract_adrs, extract_structured};
use crate::orchestration::services::OrchestrationResult;
use crate::workflow::{
    domain::{ArtifactType, Phase, Project, Run, Task, TaskId},
    ports::WorkflowRepository,
};
use mockable::Clock;
use serde_json::{Map, Value};
use tracing::{info, instrument};

impl<R, S, C> Orchestrator<R, S, C>
where
    R: WorkflowRepository,
    S: ArtifactStore,
    C: Clock + Send + Sync,
{
    /// Asks the engine for a design of `task_id` and records its decisions.
    ///
    /// Stores `architecture.json`, one markdown artifact per decision record,
    /// and the transcript. On success the task moves to the architect phase.
    /// Artifacts stored before a failure are kept.
    ///
    /// # Errors
    ///
    /// Returns [`crate::orchestration::services::OrchestrationError`] when
    /// the task or its project is unknown, the engine cannot be resolved,
    /// the prompt fails to render, or persistence fails.
    #[instrument(
        skip(self, context),
        fields(task_id = %task_id, run_id = tracing::field::Empty)
    )]
    pub async fn run_architect_phase(
        &self,
        task_id: TaskId,
        context: &str,
        engine_name: Option<&str>,
    ) -> OrchestrationResult<PhaseOutcome> {
        let task = self.load_task(task_id).await?;
        let project = self.load_project(task.project_id()).await?;
        let name = self.engine_name(engine_name);
        let engine = self.resolve_engine(name, project.root())?;

        let mut variables = Map::new();
        variables.insert("task_title".to_owned(), Value::from(task.title()));
        variables.insert(
            "task_description".to_owned(),
            Value::from(task.description()),
        );
        variables.insert("context".to_owned(), Value::from(context));
        let prompt = self.prompts.render_architect(variables)?;

        let run = self
            .start_run(project.id(), Some(task_id), Phase::Architect, name)
            .await?;
        let result = self
            .design(&project, task, &run, engine.as_ref(), &prompt)
            .await;
        self.finish_phase(run, engine.as_ref(), result).await
    }

    async fn design(
        &self,
        project: &Project,
        mut task: Task,
        run: &Run,
        engine: &dyn EngineAdapter,
        prompt: &str,
    ) -> Result<PhaseProducts, PhaseFailure> {
        open_session(engine, project.root(), None).await?;
        let reply = execute_prompt(engine, prompt).await?;

        let parsed = extract_structured(&reply);
        let degraded = parsed.is_degraded();
        let document = parsed.into_document("options");
        let mut artifacts = vec![
            self.store_json(run, ArtifactType::Architecture, "architecture.json", &document)
                .await?,
        ];
        for adr in extract_adrs(&reply) {
            let request = super::artifact_request(run, ArtifactType::Adr, &adr.file_name);
            artifacts.push(self.store_artifact(request, adr.content.as_bytes()).await?);
        }
        info!(
            run_id = %run.id(),
            decisions = artifacts.len().saturating_sub(1),
            "architecture recorded"
        );
        artifacts.push(self.store_transcript(run, engine).await?);

        task.enter_phase(Phase::Architect, &*self.clock);
        self.repository.update_task(&task).await?;
        Ok(PhaseProducts {
            task_ids: vec![task.id()],
            artifacts,
            document,
            degraded,
        })
    }
}
