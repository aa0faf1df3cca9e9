//! Gate engine: command-based validation checks that gate a coder commit.
//!
//! A [`domain::GateSpec`] names a command and a pass criterion. The
//! [`services::GateRunner`] executes specs strictly in order through a
//! [`ports::CommandExecutor`] (the sandbox [`crate::sandbox::CommandRunner`]
//! in production) and never raises: every failure becomes a non-passing
//! [`domain::GateResult`].
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Execution services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
