//! Gate execution services.

mod runner;

pub use runner::GateRunner;
