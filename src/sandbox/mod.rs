//! Sandbox boundary around externally executed processes.
//!
//! Two guards live here:
//!
//! - [`SafePathResolver`] confines file references to an allow-listed subtree
//!   of a project root, resisting `..` segments and symlink escapes.
//! - [`CommandRunner`] allow/block-lists executable names and runs commands
//!   under a hard wall-clock timeout, killing and reaping on expiry.
//!
//! Neither guard lets raw OS errors escape: everything is reported as a
//! [`SandboxError`].

mod command_runner;
mod error;
mod path_resolver;

pub use command_runner::{
    CommandOutput, CommandRunner, DEFAULT_BLOCKED_COMMANDS, DEFAULT_COMMAND_TIMEOUT,
};
pub use error::{SandboxError, SandboxResult};
pub use path_resolver::{DEFAULT_ALLOWED_PATTERN, SafePathResolver};

#[cfg(test)]
mod tests;
