//! Engine construction services.

mod registry;

pub use registry::{EngineConstructor, EngineRegistry, EngineRegistryError};
