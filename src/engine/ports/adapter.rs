//! The engine adapter contract.

use crate::engine::domain::{
    EngineMessage, EngineName, EngineResponse, EngineStatus, SessionContext,
};
use async_trait::async_trait;
use std::pin::Pin;
use tokio_stream::Stream;

/// Lazily produced chunks of engine output.
pub type ChunkStream<'a> = Pin<Box<dyn Stream<Item = String> + Send + 'a>>;

/// Session-oriented interface to an AI-assistant backend.
///
/// No method fails with an error: backend problems are reported through
/// failed [`EngineResponse`] values, an `"Error: …"` stream chunk, or a
/// `false` health check, and are reflected in [`EngineAdapter::status`].
#[async_trait]
pub trait EngineAdapter: Send + Sync {
    /// Returns the registry name of this engine.
    fn engine_name(&self) -> &EngineName;

    /// Opens a session in the context's working directory.
    ///
    /// Resets the transcript, records a system entry, and runs the priming
    /// prompt if one is given. Moves the status to `Active`, or to `Error`
    /// when priming fails.
    async fn start_session(&self, context: SessionContext) -> EngineResponse;

    /// Sends one prompt and waits for the complete reply.
    ///
    /// Only valid while `Idle` or `Active`. With `stream` set the reply is
    /// gathered through [`EngineAdapter::execute_stream`].
    async fn execute(&self, command: &str, stream: bool) -> EngineResponse;

    /// Sends one prompt and yields reply lines as the backend produces them.
    ///
    /// The completed reply is appended to the transcript once the backend
    /// exits. Failures end the stream with an `"Error: …"` chunk.
    fn execute_stream<'a>(&'a self, command: &'a str) -> ChunkStream<'a>;

    /// Kills any in-flight backend process and closes the session.
    ///
    /// Idempotent: stopping a stopped session changes nothing.
    async fn stop_session(&self) -> EngineResponse;

    /// Returns a copy of the session transcript.
    fn transcript(&self) -> Vec<EngineMessage>;

    /// Returns the current session status.
    fn status(&self) -> EngineStatus;

    /// Checks whether the backend is available.
    async fn health_check(&self) -> bool;

    /// Sends reviewer feedback about an earlier reply as another user turn.
    async fn send_feedback(&self, message_id: &str, feedback: &str) -> EngineResponse {
        tracing::debug!(message_id, "forwarding feedback as a prompt");
        self.execute(feedback, false).await
    }
}
