//! Validated engine name type.

use super::EngineDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for an engine name.
const MAX_NAME_LENGTH: usize = 100;

/// Registry name of the built-in Copilot CLI engine.
pub const COPILOT_CLI: &str = "copilot_cli";

/// Validated, lowercase alphanumeric-plus-underscores engine identifier.
///
/// Engine names key the [`crate::engine::services::EngineRegistry`] and are
/// recorded on every run (e.g. `copilot_cli`, `scripted`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EngineName(String);

impl EngineName {
    /// Creates a validated engine name.
    ///
    /// The input is trimmed and lowercased. Only characters in `[a-z0-9_]` are
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns [`EngineDomainError::EmptyEngineName`] when the value is empty
    /// after trimming, [`EngineDomainError::InvalidEngineName`] when it
    /// contains characters outside `[a-z0-9_]`, or
    /// [`EngineDomainError::EngineNameTooLong`] when it exceeds 100
    /// characters.
    pub fn new(value: impl Into<String>) -> Result<Self, EngineDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(EngineDomainError::EmptyEngineName);
        }

        if normalized.len() > MAX_NAME_LENGTH {
            return Err(EngineDomainError::EngineNameTooLong(raw));
        }

        let is_valid = normalized
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

        if !is_valid {
            return Err(EngineDomainError::InvalidEngineName(raw));
        }

        Ok(Self(normalized))
    }

    /// Returns the name of the built-in Copilot CLI engine.
    #[must_use]
    pub fn copilot_cli() -> Self {
        Self(COPILOT_CLI.to_owned())
    }

    /// Returns the engine name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EngineName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for EngineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EngineName {
    type Error = EngineDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EngineName> for String {
    fn from(value: EngineName) -> Self {
        value.0
    }
}
