//! Unit tests for version-control adapters.

mod git_tests;
