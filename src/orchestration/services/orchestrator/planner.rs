//! Planner phase: specification in, tasks and a plan artifact out.

use super::{Orchestrator, PhaseFailure, PhaseProducts, execute_prompt, open_session};
use crate::artifact::ports::ArtifactStore;
use crate::engine::ports::EngineAdapter;
use crate::events::domain::EventType;
use crate::orchestration::domain::{PhaseOutcome, PlanDocument, extract_structured};
use crate::orchestration::services::OrchestrationResult;
use crate::workflow::{
    domain::{ArtifactType, Phase, Project, ProjectId, Run},
    ports::WorkflowRepository,
    services::CreateTaskRequest,
};
use mockable::Clock;
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

impl<R, S, C> Orchestrator<R, S, C>
where
    R: WorkflowRepository,
    S: ArtifactStore,
    C: Clock + Send + Sync,
{
    /// Breaks a project specification into pending tasks.
    ///
    /// Each planned task gets an initial version holding its gates and
    /// dependencies. The plan and the engine transcript are stored as
    /// artifacts of the run. A response without decodable JSON yields an
    /// empty, degraded plan rather than a failure.
    ///
    /// # Errors
    ///
    /// Returns [`crate::orchestration::services::OrchestrationError`] when
    /// the project is unknown, the engine cannot be resolved, the prompt
    /// fails to render, or persistence fails. Engine failures after the run
    /// starts are reported in the returned outcome.
    #[instrument(
        skip(self, spec_content),
        fields(project_id = %project_id, run_id = tracing::field::Empty)
    )]
    pub async fn run_planner_phase(
        &self,
        project_id: ProjectId,
        spec_content: &str,
        engine_name: Option<&str>,
    ) -> OrchestrationResult<PhaseOutcome> {
        let project = self.load_project(project_id).await?;
        let name = self.engine_name(engine_name);
        let engine = self.resolve_engine(name, project.root())?;

        let mut context = Map::new();
        context.insert("project_name".to_owned(), Value::from(project.name()));
        context.insert("specification".to_owned(), Value::from(spec_content));
        let prompt = self.prompts.render_planner(context)?;

        let run = self
            .start_run(project_id, None, Phase::Planner, name)
            .await?;
        let result = self
            .plan(&project, &run, engine.as_ref(), spec_content, &prompt)
            .await;
        self.finish_phase(run, engine.as_ref(), result).await
    }

    async fn plan(
        &self,
        project: &Project,
        run: &Run,
        engine: &dyn EngineAdapter,
        spec_content: &str,
        prompt: &str,
    ) -> Result<PhaseProducts, PhaseFailure> {
        let priming = format!("Project specification:\n\n{spec_content}");
        open_session(engine, project.root(), Some(priming)).await?;
        let reply = execute_prompt(engine, prompt).await?;

        let parsed = extract_structured(&reply);
        let degraded = parsed.is_degraded();
        if degraded {
            warn!(run_id = %run.id(), "planner reply held no structured plan");
        }
        let document = parsed.into_document("tasks");
        let plan = PlanDocument::from_value(&document);

        let mut task_ids = Vec::with_capacity(plan.tasks.len());
        for planned in plan.tasks {
            let request = CreateTaskRequest::new(project.id(), planned.title)
                .with_description(planned.description)
                .with_priority(planned.priority)
                .with_phase(Phase::Planner)
                .with_gates(planned.gates)
                .with_dependencies(planned.dependencies);
            let task = self.lifecycle.create_task(request).await?;
            self.publish(
                self.event(EventType::TaskCreated)
                    .with_project(project.id())
                    .with_task(task.id())
                    .with_run(run.id())
                    .with_data("title", task.title()),
            );
            task_ids.push(task.id());
        }
        info!(run_id = %run.id(), tasks = task_ids.len(), "plan recorded");

        let plan_artifact = self
            .store_json(run, ArtifactType::Plan, "plan.json", &document)
            .await?;
        let transcript = self.store_transcript(run, engine).await?;
        Ok(PhaseProducts {
            task_ids,
            artifacts: vec![plan_artifact, transcript],
            document,
            degraded,
        })
    }
}
