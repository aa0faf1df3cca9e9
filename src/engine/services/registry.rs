//! Name-keyed registry of engine constructors.
//!
//! The registry is an ordinary value injected into the orchestrator; there is
//! no process-wide instance.

use crate::engine::{
    adapters::CliEngine,
    domain::{EngineConfig, EngineDomainError, EngineName},
    ports::EngineAdapter,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Builds a fresh adapter from registry settings.
pub type EngineConstructor = Arc<dyn Fn(&EngineConfig) -> Arc<dyn EngineAdapter> + Send + Sync>;

/// Errors returned by registry lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineRegistryError {
    /// No engine is registered under the requested name.
    #[error("unknown engine '{requested}', available engines: [{}]", .available.join(", "))]
    UnknownEngine {
        /// Name that was requested.
        requested: String,
        /// Names currently registered.
        available: Vec<String>,
    },

    /// The requested name is not a valid engine name.
    #[error(transparent)]
    Domain(#[from] EngineDomainError),
}

/// Registry mapping engine names to constructors.
///
/// Clones share the same underlying table.
#[derive(Clone, Default)]
pub struct EngineRegistry {
    constructors: Arc<RwLock<BTreeMap<EngineName, EngineConstructor>>>,
}

impl fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("engines", &self.list_engines())
            .finish()
    }
}

impl EngineRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in engines (`copilot_cli`).
    #[must_use]
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(EngineName::copilot_cli(), |config| {
            let engine: Arc<dyn EngineAdapter> = Arc::new(CliEngine::copilot(config));
            engine
        });
        registry
    }

    /// Registers `constructor` under `name`, replacing any previous entry.
    pub fn register<F>(&self, name: EngineName, constructor: F)
    where
        F: Fn(&EngineConfig) -> Arc<dyn EngineAdapter> + Send + Sync + 'static,
    {
        self.constructors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, Arc::new(constructor));
    }

    /// Builds a new adapter for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineRegistryError::Domain`] when `name` is not a valid
    /// engine name, or [`EngineRegistryError::UnknownEngine`] listing the
    /// registered names when nothing is registered under it.
    pub fn create(
        &self,
        name: &str,
        config: &EngineConfig,
    ) -> Result<Arc<dyn EngineAdapter>, EngineRegistryError> {
        let engine_name = EngineName::new(name)?;
        let constructor = self
            .constructors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&engine_name)
            .cloned();
        constructor
            .map(|build| build(config))
            .ok_or_else(|| EngineRegistryError::UnknownEngine {
                requested: name.to_owned(),
                available: self
                    .list_engines()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            })
    }

    /// Returns the registered names in sorted order.
    #[must_use]
    pub fn list_engines(&self) -> Vec<EngineName> {
        self.constructors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Returns `true` when `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &EngineName) -> bool {
        self.constructors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}
