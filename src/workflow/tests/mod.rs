//! Unit tests for workflow records, persistence, and lifecycle services.

mod repository_tests;
mod service_tests;
