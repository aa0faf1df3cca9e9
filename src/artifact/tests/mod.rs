//! Unit tests for artifact storage.
