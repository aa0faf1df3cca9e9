//! The phase orchestrator and the plumbing its phases share.

mod architect;
mod coder;
mod planner;
mod review;
mod run_log;

use super::{OrchestrationError, OrchestrationResult, OrchestratorConfig, PromptLibrary};
use crate::artifact::ports::{ArtifactStore, ArtifactStoreError};
use crate::engine::{
    domain::{EngineConfig, SessionContext},
    ports::EngineAdapter,
    services::EngineRegistry,
};
use crate::events::{
    adapters::NoopEventPublisher,
    domain::{Event, EventType},
    ports::EventPublisher,
};
use crate::gate::services::GateRunner;
use crate::orchestration::domain::PhaseOutcome;
use crate::vcs::{adapters::NoopCommitter, ports::CommitCollaborator};
use crate::workflow::{
    domain::{
        Artifact, ArtifactType, NewArtifact, Phase, Project, ProjectId, Run, RunStatus, Task,
        TaskId, WorkflowDomainError,
    },
    ports::{WorkflowRepository, WorkflowRepositoryError},
    services::{TaskLifecycleError, TaskLifecycleService},
};
use mockable::Clock;
use run_log::{RunJournals, RunLog};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{Span, field, info, warn};

/// Why a run failed after it was created.
#[derive(Debug, Error)]
enum PhaseFailure {
    #[error("engine '{0}' failed its health check")]
    Unhealthy(String),
    #[error("session start failed: {0}")]
    Session(String),
    #[error("engine execution failed: {0}")]
    Execution(String),
    #[error(transparent)]
    Orchestration(#[from] OrchestrationError),
}

impl From<WorkflowRepositoryError> for PhaseFailure {
    fn from(err: WorkflowRepositoryError) -> Self {
        Self::Orchestration(err.into())
    }
}

impl From<ArtifactStoreError> for PhaseFailure {
    fn from(err: ArtifactStoreError) -> Self {
        Self::Orchestration(err.into())
    }
}

impl From<WorkflowDomainError> for PhaseFailure {
    fn from(err: WorkflowDomainError) -> Self {
        Self::Orchestration(err.into())
    }
}

impl From<TaskLifecycleError> for PhaseFailure {
    fn from(err: TaskLifecycleError) -> Self {
        Self::Orchestration(err.into())
    }
}

/// What a planner or architect run produced before it completed.
#[derive(Debug, Default)]
struct PhaseProducts {
    task_ids: Vec<TaskId>,
    artifacts: Vec<Artifact>,
    document: serde_json::Value,
    degraded: bool,
}

/// Sequences the planner, architect, review, and coder phases.
#[derive(Clone)]
pub struct Orchestrator<R, S, C>
where
    R: WorkflowRepository,
    S: ArtifactStore,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    artifacts: Arc<S>,
    clock: Arc<C>,
    engines: EngineRegistry,
    gates: GateRunner<C>,
    committer: Arc<dyn CommitCollaborator>,
    events: Arc<dyn EventPublisher>,
    prompts: PromptLibrary,
    config: OrchestratorConfig,
    lifecycle: TaskLifecycleService<R, C>,
    journals: RunJournals,
}

impl<R, S, C> Orchestrator<R, S, C>
where
    R: WorkflowRepository,
    S: ArtifactStore,
    C: Clock + Send + Sync,
{
    /// Creates an orchestrator that neither commits nor publishes events.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        artifacts: Arc<S>,
        clock: Arc<C>,
        engines: EngineRegistry,
        gates: GateRunner<C>,
    ) -> Self {
        let lifecycle = TaskLifecycleService::new(Arc::clone(&repository), Arc::clone(&clock));
        Self {
            repository,
            artifacts,
            clock,
            engines,
            gates,
            committer: Arc::new(NoopCommitter),
            events: Arc::new(NoopEventPublisher),
            prompts: PromptLibrary::builtin(),
            config: OrchestratorConfig::default(),
            lifecycle,
            journals: RunJournals::default(),
        }
    }

    /// Sets the commit collaborator used after passing gates.
    #[must_use]
    pub fn with_committer(mut self, committer: Arc<dyn CommitCollaborator>) -> Self {
        self.committer = committer;
        self
    }

    /// Sets the event publisher.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = events;
        self
    }

    /// Sets the prompt templates.
    #[must_use]
    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = prompts;
        self
    }

    /// Sets the orchestrator configuration.
    #[must_use]
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Returns the lifecycle service sharing this orchestrator's repository.
    #[must_use]
    pub const fn lifecycle(&self) -> &TaskLifecycleService<R, C> {
        &self.lifecycle
    }

    fn event(&self, event_type: EventType) -> Event {
        Event::new(event_type, &*self.clock)
    }

    fn publish(&self, event: Event) {
        self.journals.record(&event);
        self.events.publish(event);
    }

    async fn load_project(&self, project_id: ProjectId) -> OrchestrationResult<Project> {
        self.repository
            .find_project(project_id)
            .await?
            .ok_or_else(|| OrchestrationError::not_found("project", project_id))
    }

    async fn load_task(&self, task_id: TaskId) -> OrchestrationResult<Task> {
        self.repository
            .find_task(task_id)
            .await?
            .ok_or_else(|| OrchestrationError::not_found("task", task_id))
    }

    fn engine_name<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested.unwrap_or_else(|| self.config.default_engine())
    }

    fn resolve_engine(
        &self,
        name: &str,
        root: &Path,
    ) -> OrchestrationResult<Arc<dyn EngineAdapter>> {
        let config = EngineConfig::new()
            .with_working_directory(root)
            .with_timeout(self.config.engine_timeout());
        Ok(self.engines.create(name, &config)?)
    }

    async fn start_run(
        &self,
        project_id: ProjectId,
        task_id: Option<TaskId>,
        phase: Phase,
        engine: &str,
    ) -> OrchestrationResult<Run> {
        let run = Run::start(project_id, task_id, phase, engine, &*self.clock);
        self.repository.create_run(&run).await?;
        Span::current().record("run_id", field::display(run.id()));
        self.journals.open(run.id());
        info!(run_id = %run.id(), %phase, engine, "run started");

        let mut started = self
            .event(EventType::RunStarted)
            .with_project(project_id)
            .with_run(run.id())
            .with_data("phase", phase.as_str())
            .with_data("engine", engine);
        let mut phase_started = self
            .event(EventType::PhaseStarted)
            .with_project(project_id)
            .with_run(run.id())
            .with_data("phase", phase.as_str());
        if let Some(id) = task_id {
            started = started.with_task(id);
            phase_started = phase_started.with_task(id);
        }
        self.publish(started);
        self.publish(phase_started);
        Ok(run)
    }

    /// Persists the completed run and announces the result.
    async fn record_run(&self, run: &Run) -> OrchestrationResult<()> {
        self.repository.update_run(run).await?;
        let event_type = if run.status() == RunStatus::Success {
            EventType::RunCompleted
        } else {
            EventType::RunFailed
        };
        let mut event = self
            .event(event_type)
            .with_project(run.project_id())
            .with_run(run.id())
            .with_data("phase", run.phase().as_str())
            .with_data("status", run.status().as_str());
        if let Some(error) = run.error() {
            event = event.with_data("error", error);
        }
        if let Some(id) = run.task_id() {
            event = event.with_task(id);
        }
        self.publish(event);
        info!(run_id = %run.id(), status = %run.status(), "run finished");
        self.store_run_log(run).await;
        Ok(())
    }

    /// Stores the run's journal as a log artifact. Failures are logged only.
    async fn store_run_log(&self, run: &Run) {
        let log = RunLog {
            run,
            events: self.journals.close(run.id()),
        };
        let name = RunLog::file_name(run);
        if let Err(err) = self.store_json(run, ArtifactType::Log, &name, &log).await {
            warn!(run_id = %run.id(), error = %err, "run log not stored");
        }
    }

    fn phase_completed(&self, run: &Run) {
        let mut event = self
            .event(EventType::PhaseCompleted)
            .with_project(run.project_id())
            .with_run(run.id())
            .with_data("phase", run.phase().as_str());
        if let Some(id) = run.task_id() {
            event = event.with_task(id);
        }
        self.publish(event);
    }

    /// Fails `run` with `failure`, stops the session, and persists the run.
    async fn abort_run(
        &self,
        run: &mut Run,
        engine: &dyn EngineAdapter,
        failure: &PhaseFailure,
    ) -> OrchestrationResult<String> {
        let message = failure.to_string();
        warn!(run_id = %run.id(), error = %message, "run failed");
        engine.stop_session().await;
        run.fail(message.clone(), &*self.clock)?;
        self.record_run(run).await?;
        Ok(message)
    }

    /// Completes a planner or architect run from its result.
    async fn finish_phase(
        &self,
        mut run: Run,
        engine: &dyn EngineAdapter,
        result: Result<PhaseProducts, PhaseFailure>,
    ) -> OrchestrationResult<PhaseOutcome> {
        match result {
            Ok(products) => {
                engine.stop_session().await;
                run.succeed(&*self.clock)?;
                self.record_run(&run).await?;
                self.phase_completed(&run);
                Ok(PhaseOutcome {
                    run,
                    task_ids: products.task_ids,
                    artifacts: products.artifacts,
                    document: products.document,
                    degraded: products.degraded,
                    error: None,
                })
            }
            Err(failure) => {
                let message = self.abort_run(&mut run, engine, &failure).await?;
                Ok(PhaseOutcome {
                    run,
                    task_ids: Vec::new(),
                    artifacts: Vec::new(),
                    document: serde_json::Value::Null,
                    degraded: false,
                    error: Some(message),
                })
            }
        }
    }

    async fn store_artifact(
        &self,
        request: NewArtifact,
        content: &[u8],
    ) -> OrchestrationResult<Artifact> {
        let artifact = self.artifacts.store(request, content).await?;
        let mut event = self
            .event(EventType::ArtifactCreated)
            .with_project(artifact.project_id())
            .with_data("artifact_id", artifact.id().to_string())
            .with_data("name", artifact.name())
            .with_data("artifact_type", artifact.artifact_type().as_str());
        if let Some(id) = artifact.task_id() {
            event = event.with_task(id);
        }
        if let Some(id) = artifact.run_id() {
            event = event.with_run(id);
        }
        self.publish(event);
        Ok(artifact)
    }

    async fn store_json(
        &self,
        run: &Run,
        artifact_type: ArtifactType,
        name: &str,
        document: &impl serde::Serialize,
    ) -> Result<Artifact, PhaseFailure> {
        let content = serde_json::to_vec_pretty(document)
            .map_err(|err| OrchestrationError::Configuration(err.to_string()))?;
        let artifact = self
            .store_artifact(artifact_request(run, artifact_type, name), &content)
            .await?;
        Ok(artifact)
    }

    async fn store_transcript(
        &self,
        run: &Run,
        engine: &dyn EngineAdapter,
    ) -> Result<Artifact, PhaseFailure> {
        let name = format!("{}-transcript.json", run.phase().as_str());
        self.store_json(run, ArtifactType::Transcript, &name, &engine.transcript())
            .await
    }
}

/// Checks engine health and starts a session in `root`.
async fn open_session(
    engine: &dyn EngineAdapter,
    root: &Path,
    priming: Option<String>,
) -> Result<(), PhaseFailure> {
    if !engine.health_check().await {
        return Err(PhaseFailure::Unhealthy(engine.engine_name().to_string()));
    }
    let mut context = SessionContext::new(root);
    if let Some(prompt) = priming {
        context = context.with_initial_prompt(prompt);
    }
    let response = engine.start_session(context).await;
    if !response.is_success() {
        return Err(PhaseFailure::Session(
            response.error().unwrap_or("unknown error").to_owned(),
        ));
    }
    Ok(())
}

/// Executes one prompt and returns the response text.
async fn execute_prompt(engine: &dyn EngineAdapter, prompt: &str) -> Result<String, PhaseFailure> {
    let response = engine.execute(prompt, false).await;
    if !response.is_success() {
        return Err(PhaseFailure::Execution(
            response.error().unwrap_or("unknown error").to_owned(),
        ));
    }
    Ok(response.into_content())
}

fn artifact_request(run: &Run, artifact_type: ArtifactType, name: &str) -> NewArtifact {
    let mut request = NewArtifact::new(run.project_id(), artifact_type, name).with_run(run.id());
    if let Some(id) = run.task_id() {
        request = request.with_task(id);
    }
    request
}
