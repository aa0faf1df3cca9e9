//! Event publisher adapters.

pub mod broadcast;
pub mod noop;

pub use broadcast::{BroadcastEventPublisher, DEFAULT_HISTORY_LIMIT};
pub use noop::NoopEventPublisher;
