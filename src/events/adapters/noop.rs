//! Publisher that drops every event.

use crate::events::{domain::Event, ports::EventPublisher};
use tracing::trace;

/// Discards events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventPublisher;

impl EventPublisher for NoopEventPublisher {
    fn publish(&self, event: Event) {
        trace!(event_type = %event.event_type(), "event dropped");
    }
}
