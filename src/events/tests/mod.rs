//! Unit tests for event publishing.
