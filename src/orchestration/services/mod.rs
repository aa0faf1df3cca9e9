//! Phase orchestration services.

mod config;
mod error;
mod orchestrator;
mod prompts;

pub use config::OrchestratorConfig;
pub use error::{OrchestrationError, OrchestrationResult};
pub use orchestrator::Orchestrator;
pub use prompts::{ARCHITECT_TEMPLATE, CODER_TEMPLATE, PLANNER_TEMPLATE, PromptLibrary};
