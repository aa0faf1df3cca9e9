//! Transcript and status bookkeeping shared by engine adapters.

use crate::engine::domain::{EngineMessage, EngineStatus, MessageRole};
use mockable::{Clock, DefaultClock};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct SessionState {
    status: EngineStatus,
    transcript: Vec<EngineMessage>,
    working_directory: Option<PathBuf>,
    session_id: Option<String>,
}

/// Interior-mutable session record.
///
/// The lock is never held across an await point. Session identifiers and
/// transcript timestamps come from the session clock.
pub(crate) struct Session {
    state: Mutex<SessionState>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClock))
    }
}

impl Session {
    pub(crate) fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            clock,
        }
    }

    /// Replaces the clock, keeping the recorded state.
    pub(crate) fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Creates a transcript entry stamped by the session clock.
    pub(crate) fn message(&self, role: MessageRole, content: impl Into<String>) -> EngineMessage {
        EngineMessage::new(role, content, self.clock.utc())
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clears the transcript and opens a new `Idle` session in `dir`.
    pub(crate) fn reset(&self, dir: &Path) -> String {
        let session_id = format!("session_{}", self.clock.utc().format("%Y%m%d_%H%M%S"));
        let mut state = self.lock();
        state.status = EngineStatus::Idle;
        state.transcript.clear();
        state.working_directory = Some(dir.to_path_buf());
        state.session_id = Some(session_id.clone());
        session_id
    }

    pub(crate) fn status(&self) -> EngineStatus {
        self.lock().status
    }

    pub(crate) fn set_status(&self, status: EngineStatus) {
        self.lock().status = status;
    }

    pub(crate) fn push(&self, message: EngineMessage) {
        self.lock().transcript.push(message);
    }

    pub(crate) fn transcript(&self) -> Vec<EngineMessage> {
        self.lock().transcript.clone()
    }

    pub(crate) fn set_working_directory(&self, dir: PathBuf) {
        self.lock().working_directory = Some(dir);
    }

    pub(crate) fn working_directory(&self) -> Option<PathBuf> {
        self.lock().working_directory.clone()
    }

    pub(crate) fn session_id(&self) -> Option<String> {
        self.lock().session_id.clone()
    }

    /// Records the termination entry and moves to `Stopped`.
    ///
    /// Returns `false` when the session was already stopped.
    pub(crate) fn stop(&self) -> bool {
        let mut entry = self.message(MessageRole::System, "Session terminated");
        let mut state = self.lock();
        if state.status == EngineStatus::Stopped {
            return false;
        }
        if let Some(id) = &state.session_id {
            entry = entry.with_metadata("session_id", id.clone());
        }
        state.transcript.push(entry);
        state.status = EngineStatus::Stopped;
        true
    }
}
