//! Event publisher port.

use crate::events::domain::Event;

/// Delivers lifecycle events to whoever is listening.
///
/// Publishing never fails and never blocks on slow consumers.
pub trait EventPublisher: Send + Sync {
    /// Publishes one event.
    fn publish(&self, event: Event);
}
