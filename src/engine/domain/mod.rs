//! Domain model for engine sessions.

mod config;
mod error;
mod message;
mod name;
mod response;
mod status;

pub use config::{EngineConfig, SessionContext};
pub use error::{EngineDomainError, EngineExecutionError, ParseEngineStatusError};
pub use message::{EngineMessage, MessageRole};
pub use name::{COPILOT_CLI, EngineName};
pub use response::EngineResponse;
pub use status::EngineStatus;
