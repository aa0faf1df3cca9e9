//! Engine adapter implementations.

pub mod cli;
pub mod scripted;
mod session;

pub use cli::{CliEngine, DEFAULT_ENGINE_TIMEOUT, DEFAULT_HEALTH_TIMEOUT};
pub use scripted::{ScriptedEngine, ScriptedReply};
