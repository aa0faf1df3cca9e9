//! Engine session status.

use super::ParseEngineStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an engine session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    /// No session has been started yet.
    #[default]
    Idle,
    /// A session is open and accepting prompts.
    Active,
    /// The session failed and no longer accepts prompts.
    Error,
    /// The session was terminated.
    Stopped,
}

impl EngineStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Error => "error",
            Self::Stopped => "stopped",
        }
    }

    /// Returns `true` when prompts may be executed in this status.
    #[must_use]
    pub const fn accepts_prompts(self) -> bool {
        matches!(self, Self::Idle | Self::Active)
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EngineStatus {
    type Error = ParseEngineStatusError;

    fn try_from(value: &str) -> Result<Self, ParseEngineStatusError> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "idle" => Ok(Self::Idle),
            "active" => Ok(Self::Active),
            "error" => Ok(Self::Error),
            "stopped" => Ok(Self::Stopped),
            _ => Err(ParseEngineStatusError(value.to_owned())),
        }
    }
}
