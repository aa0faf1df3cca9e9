//! Adapters implementing gate ports.

pub mod sandbox;
