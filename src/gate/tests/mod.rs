//! Unit tests for the gate engine.

mod domain_tests;
