//! Port contracts for gate execution.

pub mod executor;

pub use executor::CommandExecutor;
