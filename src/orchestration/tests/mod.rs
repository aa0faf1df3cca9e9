//! Unit tests for response parsing, prompts, and the phase orchestrator.

mod planner_tests;
mod support;
