//! In-process fan-out over a tokio broadcast channel.

use crate::events::{
    domain::{Event, HistoryQuery},
    ports::EventPublisher,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::debug;

/// Number of events kept for late subscribers.
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

/// Broadcasts events to live subscribers and keeps a bounded history.
///
/// Slow subscribers may lag and miss events; the history is the catch-up
/// path.
#[derive(Debug, Clone)]
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<Event>,
    history: Arc<Mutex<VecDeque<Event>>>,
    history_limit: usize,
}

impl Default for BroadcastEventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastEventPublisher {
    /// Creates a publisher keeping [`DEFAULT_HISTORY_LIMIT`] events.
    #[must_use]
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Creates a publisher keeping at most `limit` events.
    #[must_use]
    pub fn with_history_limit(limit: usize) -> Self {
        let (sender, _) = broadcast::channel(limit.max(1));
        Self {
            sender,
            history: Arc::new(Mutex::new(VecDeque::with_capacity(limit))),
            history_limit: limit,
        }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Returns the retained events, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Event> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Returns the retained events selected by `query`, oldest first.
    #[must_use]
    pub fn query(&self, query: &HistoryQuery) -> Vec<Event> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let matched: Vec<Event> = history
            .iter()
            .filter(|event| query.matches(event))
            .cloned()
            .collect();
        let excess = query
            .limit()
            .map_or(0, |limit| matched.len().saturating_sub(limit));
        matched.into_iter().skip(excess).collect()
    }

    /// Forgets every retained event.
    pub fn clear_history(&self) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!("event history cleared");
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventPublisher for BroadcastEventPublisher {
    fn publish(&self, event: Event) {
        {
            let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
            history.push_back(event.clone());
            while history.len() > self.history_limit {
                history.pop_front();
            }
        }
        let event_type = event.event_type();
        match self.sender.send(event) {
            Ok(receivers) => debug!(%event_type, receivers, "event published"),
            Err(_) => debug!(%event_type, "event published without subscribers"),
        }
    }
}
