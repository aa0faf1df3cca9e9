//! Event records.

mod event;
mod query;

pub use event::{Event, EventType};
pub use query::HistoryQuery;
