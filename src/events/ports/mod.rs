//! Port contracts for event delivery.

pub mod publisher;

pub use publisher::EventPublisher;
