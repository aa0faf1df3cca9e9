//! Shared world state for coder gate BDD scenarios.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use changeforge::artifact::adapters::FsArtifactStore;
use changeforge::engine::{
    adapters::ScriptedEngine, domain::EngineName, ports::EngineAdapter, services::EngineRegistry,
};
use changeforge::gate::services::GateRunner;
use changeforge::orchestration::{
    domain::CoderOutcome,
    services::{OrchestrationError, Orchestrator, OrchestratorConfig},
};
use changeforge::sandbox::CommandRunner;
use changeforge::vcs::ports::{CommitCollaborator, TaskCommitRequest, VcsResult};
use changeforge::workflow::{
    adapters::memory::InMemoryWorkflowRepository,
    domain::{Project, Task},
};
use mockable::DefaultClock;
use rstest::fixture;
use tempfile::TempDir;

/// Engine name registered for the scenarios.
pub const ENGINE: &str = "scripted";

/// Orchestrator type used by the BDD world.
pub type TestOrchestrator = Orchestrator<
    InMemoryWorkflowRepository,
    FsArtifactStore<InMemoryWorkflowRepository, DefaultClock>,
    DefaultClock,
>;

/// Commit collaborator that records every request it receives.
#[derive(Debug, Default)]
pub struct RecordingCommitter {
    requests: Mutex<Vec<TaskCommitRequest>>,
}

impl RecordingCommitter {
    /// Returns how many commits were requested.
    pub fn count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl CommitCollaborator for RecordingCommitter {
    async fn create_task_commit(&self, request: TaskCommitRequest) -> VcsResult<Option<String>> {
        let mut requests = self
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        requests.push(request);
        Ok(Some(format!("commit-{}", requests.len())))
    }
}

/// Scenario world for coder gate behaviour tests.
pub struct CoderWorld {
    pub orchestrator: TestOrchestrator,
    pub engine: Arc<ScriptedEngine>,
    pub committer: Arc<RecordingCommitter>,
    pub root: TempDir,
    pub project: Option<Project>,
    pub task: Option<Task>,
    pub outcome: Option<Result<CoderOutcome, OrchestrationError>>,
    _storage: TempDir,
}

impl CoderWorld {
    /// Creates a world with a scripted engine and an empty repository.
    ///
    /// # Panics
    ///
    /// Panics when temporary directories cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let root = TempDir::new().expect("project root");
        let storage = TempDir::new().expect("artifact storage");
        let repository = Arc::new(InMemoryWorkflowRepository::new());
        let clock = Arc::new(DefaultClock);
        let artifacts = Arc::new(FsArtifactStore::new(
            storage.path(),
            Arc::clone(&repository),
            Arc::clone(&clock),
        ));

        let engine = Arc::new(ScriptedEngine::new(
            EngineName::new(ENGINE).expect("engine name"),
        ));
        let registry = EngineRegistry::new();
        let shared = Arc::clone(&engine);
        registry.register(EngineName::new(ENGINE).expect("engine name"), move |_| {
            let adapter: Arc<dyn EngineAdapter> = shared.clone();
            adapter
        });

        let committer = Arc::new(RecordingCommitter::default());
        let gates = GateRunner::new(Arc::new(CommandRunner::new()), Arc::clone(&clock));
        let orchestrator = Orchestrator::new(repository, artifacts, clock, registry, gates)
            .with_committer(committer.clone())
            .with_config(OrchestratorConfig::new().with_default_engine(ENGINE));

        Self {
            orchestrator,
            engine,
            committer,
            root,
            project: None,
            task: None,
            outcome: None,
            _storage: storage,
        }
    }
}

impl Default for CoderWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> CoderWorld {
    CoderWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
