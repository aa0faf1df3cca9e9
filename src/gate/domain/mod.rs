//! Gate specifications, results, and summaries.

mod result;
mod spec;

pub use result::{GateResult, GateRunReport, GateSummary, all_passed};
pub use spec::{DEFAULT_GATE_TIMEOUT_SECS, GateSpec, PassCriteria};
