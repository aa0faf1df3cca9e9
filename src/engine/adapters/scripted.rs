//! In-memory engine replaying queued replies, for tests and dry runs.

use super::session::Session;
use crate::engine::{
    domain::{
        EngineMessage, EngineName, EngineResponse, EngineStatus, MessageRole, SessionContext,
    },
    ports::{ChunkStream, EngineAdapter},
};
use async_trait::async_trait;
use mockable::Clock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One queued engine reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    /// The prompt succeeds with this text.
    Text(String),
    /// The prompt fails with this error.
    Failure(String),
}

/// Engine answering prompts from a reply queue.
///
/// Every prompt consumes the next reply; an empty queue fails the prompt.
/// Prompts are recorded so callers can inspect what the pipeline sent.
#[derive(Debug)]
pub struct ScriptedEngine {
    name: EngineName,
    replies: Mutex<VecDeque<ScriptedReply>>,
    prompts: Mutex<Vec<String>>,
    healthy: AtomicBool,
    session: Session,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedEngine {
    /// Creates a healthy engine with an empty reply queue.
    #[must_use]
    pub fn new(name: EngineName) -> Self {
        Self {
            name,
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            healthy: AtomicBool::new(true),
            session: Session::default(),
        }
    }

    /// Sets the clock stamping session ids and transcript entries.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.session = self.session.with_clock(clock);
        self
    }

    /// Queues a successful reply.
    #[must_use]
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.push(ScriptedReply::Text(text.into()));
        self
    }

    /// Queues a failing reply.
    #[must_use]
    pub fn with_failure(self, error: impl Into<String>) -> Self {
        self.push(ScriptedReply::Failure(error.into()));
        self
    }

    /// Sets the health check result.
    #[must_use]
    pub fn with_healthy(self, healthy: bool) -> Self {
        self.healthy.store(healthy, Ordering::SeqCst);
        self
    }

    /// Appends a reply to the queue.
    pub fn push(&self, reply: ScriptedReply) {
        lock(&self.replies).push_back(reply);
    }

    /// Returns every prompt received so far, in order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    fn next_reply(&self, prompt: &str) -> ScriptedReply {
        lock(&self.prompts).push(prompt.to_owned());
        lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| ScriptedReply::Failure("no scripted reply queued".to_owned()))
    }
}

#[async_trait]
impl EngineAdapter for ScriptedEngine {
    fn engine_name(&self) -> &EngineName {
        &self.name
    }

    async fn start_session(&self, context: SessionContext) -> EngineResponse {
        let dir = context.working_directory();
        let session_id = self.session.reset(dir);
        self.session.push(
            self.session
                .message(
                    MessageRole::System,
                    format!("Session started in {}", dir.display()),
                )
                .with_metadata("session_id", session_id.clone()),
        );
        if let Some(prompt) = context.initial_prompt() {
            let primed = self.execute(prompt, false).await;
            if !primed.is_success() {
                self.session.set_status(EngineStatus::Error);
                return primed;
            }
        }
        self.session.set_status(EngineStatus::Active);
        EngineResponse::success("Session initialized", EngineStatus::Active)
            .with_messages(self.session.transcript())
            .with_metadata("session_id", session_id)
    }

    async fn execute(&self, command: &str, _stream: bool) -> EngineResponse {
        let status = self.session.status();
        if !status.accepts_prompts() {
            return EngineResponse::failure(format!("Cannot execute in status {status}"), status);
        }
        let user = self.session.message(MessageRole::User, command);
        self.session.push(user.clone());
        match self.next_reply(command) {
            ScriptedReply::Text(text) => {
                let assistant = self.session.message(MessageRole::Assistant, text.clone());
                self.session.push(assistant.clone());
                EngineResponse::success(text, status).with_messages(vec![user, assistant])
            }
            ScriptedReply::Failure(error) => EngineResponse::failure(error, EngineStatus::Error),
        }
    }

    fn execute_stream<'a>(&'a self, command: &'a str) -> ChunkStream<'a> {
        Box::pin(async_stream::stream! {
            let response = self.execute(command, false).await;
            if response.is_success() {
                for line in response.content().lines() {
                    yield line.to_owned();
                }
            } else {
                if self.session.status().accepts_prompts() {
                    self.session.set_status(EngineStatus::Error);
                }
                yield format!("Error: {}", response.error().unwrap_or_default());
            }
        })
    }

    async fn stop_session(&self) -> EngineResponse {
        self.session.stop();
        EngineResponse::success("Session stopped", EngineStatus::Stopped)
    }

    fn transcript(&self) -> Vec<EngineMessage> {
        self.session.transcript()
    }

    fn status(&self) -> EngineStatus {
        self.session.status()
    }

    async fn health_check(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}
