//! Parsing and outcome types for phase execution.

mod outcome;
mod parser;
mod plan;

pub use outcome::{CoderOutcome, PhaseOutcome};
pub use parser::{AdrDocument, FencedBlock, ParsedResponse, extract_adrs, extract_structured, fenced_blocks};
pub use plan::{PlanDocument, PlannedTask};
