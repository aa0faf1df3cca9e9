//! Port contracts for engine adapters.

pub mod adapter;

pub use adapter::{ChunkStream, EngineAdapter};
