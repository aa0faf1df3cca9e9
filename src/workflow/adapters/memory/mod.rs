//! In-memory adapters for tests and single-process runs.

mod repository;

pub use repository::InMemoryWorkflowRepository;
