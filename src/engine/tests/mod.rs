//! Unit tests for engine adapters and the registry.

mod cli_tests;
mod domain_tests;
mod scripted_tests;
