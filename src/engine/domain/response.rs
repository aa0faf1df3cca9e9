//! Result of one engine interaction.

use super::{EngineMessage, EngineStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome returned by every engine operation.
///
/// Failures are values: `success == false` with `error` describing why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineResponse {
    success: bool,
    content: String,
    status: EngineStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    messages: Vec<EngineMessage>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    metadata: Map<String, Value>,
}

impl EngineResponse {
    /// Creates a successful response.
    #[must_use]
    pub fn success(content: impl Into<String>, status: EngineStatus) -> Self {
        Self {
            success: true,
            content: content.into(),
            status,
            error: None,
            messages: Vec::new(),
            metadata: Map::new(),
        }
    }

    /// Creates a failed response.
    #[must_use]
    pub fn failure(error: impl Into<String>, status: EngineStatus) -> Self {
        Self {
            success: false,
            content: String::new(),
            status,
            error: Some(error.into()),
            messages: Vec::new(),
            metadata: Map::new(),
        }
    }

    /// Sets partial content produced before a failure.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Attaches the transcript entries produced by this interaction.
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<EngineMessage>) -> Self {
        self.messages = messages;
        self
    }

    /// Attaches a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns `true` when the interaction succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// Returns the engine's reply text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consumes the response, returning the reply text.
    #[must_use]
    pub fn into_content(self) -> String {
        self.content
    }

    /// Returns the session status after the interaction.
    #[must_use]
    pub const fn status(&self) -> EngineStatus {
        self.status
    }

    /// Returns the failure description, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the transcript entries produced by this interaction.
    #[must_use]
    pub fn messages(&self) -> &[EngineMessage] {
        &self.messages
    }

    /// Returns attached metadata.
    #[must_use]
    pub const fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }
}
