//! Step definitions for coder gate scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
