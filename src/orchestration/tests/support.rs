//! Shared orchestrator wiring for phase tests.

use crate::artifact::adapters::FsArtifactStore;
use crate::engine::{
    adapters::ScriptedEngine, domain::EngineName, ports::EngineAdapter,
    services::EngineRegistry,
};
use crate::events::adapters::BroadcastEventPublisher;
use crate::events::domain::EventType;
use crate::gate::{domain::GateSpec, services::GateRunner};
use crate::orchestration::services::{Orchestrator, OrchestratorConfig};
use crate::sandbox::CommandRunner;
use crate::vcs::ports::CommitCollaborator;
use crate::workflow::{
    adapters::memory::InMemoryWorkflowRepository,
    domain::{Project, Task},
    services::CreateTaskRequest,
};
use mockable::DefaultClock;
use std::sync::Arc;
use tempfile::TempDir;

pub(super) const ENGINE: &str = "scripted";

pub(super) type TestStore = FsArtifactStore<InMemoryWorkflowRepository, DefaultClock>;
pub(super) type TestOrchestrator =
    Orchestrator<InMemoryWorkflowRepository, TestStore, DefaultClock>;

/// Orchestrator over in-memory state, a temporary project root, and one
/// scripted engine registered as `scripted`.
pub(super) struct Harness {
    pub orchestrator: TestOrchestrator,
    pub repository: Arc<InMemoryWorkflowRepository>,
    pub artifacts: Arc<TestStore>,
    pub events: Arc<BroadcastEventPublisher>,
    pub engine: Arc<ScriptedEngine>,
    pub project: Project,
    _root: TempDir,
    _storage: TempDir,
}

impl Harness {
    pub(super) async fn new(engine: ScriptedEngine) -> Self {
        let root = TempDir::new().expect("project root");
        let storage = TempDir::new().expect("artifact storage");
        let repository = Arc::new(InMemoryWorkflowRepository::new());
        let clock = Arc::new(DefaultClock);
        let artifacts = Arc::new(FsArtifactStore::new(
            storage.path(),
            Arc::clone(&repository),
            Arc::clone(&clock),
        ));
        let engine = Arc::new(engine);
        let registry = EngineRegistry::new();
        let shared = Arc::clone(&engine);
        registry.register(EngineName::new(ENGINE).expect("engine name"), move |_| {
            let adapter: Arc<dyn EngineAdapter> = shared.clone();
            adapter
        });
        let gates = GateRunner::new(Arc::new(CommandRunner::new()), Arc::clone(&clock));
        let events = Arc::new(BroadcastEventPublisher::new());

        let orchestrator = Orchestrator::new(
            Arc::clone(&repository),
            Arc::clone(&artifacts),
            clock,
            registry,
            gates,
        )
        .with_events(events.clone())
        .with_config(OrchestratorConfig::new().with_default_engine(ENGINE));
        let project = orchestrator
            .lifecycle()
            .create_project("demo", root.path())
            .await
            .expect("project");

        Self {
            orchestrator,
            repository,
            artifacts,
            events,
            engine,
            project,
            _root: root,
            _storage: storage,
        }
    }

    pub(super) fn with_committer(mut self, committer: Arc<dyn CommitCollaborator>) -> Self {
        self.orchestrator = self.orchestrator.with_committer(committer);
        self
    }

    pub(super) fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.orchestrator = self.orchestrator.with_config(config);
        self
    }

    pub(super) async fn task(&self, title: &str, gates: Vec<GateSpec>) -> Task {
        self.orchestrator
            .lifecycle()
            .create_task(CreateTaskRequest::new(self.project.id(), title).with_gates(gates))
            .await
            .expect("task")
    }

    pub(super) async fn approved_task(&self, title: &str, gates: Vec<GateSpec>) -> Task {
        let task = self.task(title, gates).await;
        self.orchestrator
            .approve_task(task.id())
            .await
            .expect("approval")
    }

    pub(super) fn event_types(&self) -> Vec<EventType> {
        self.events
            .history()
            .iter()
            .map(crate::events::domain::Event::event_type)
            .collect()
    }
}
