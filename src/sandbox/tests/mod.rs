//! Unit tests for the sandbox boundary.
