//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The adapter
//! depends only on these traits and wire models, not on a concrete client.

mod aggregator;
pub mod models;

pub use aggregator::{AggregatorClient, VendorError, VendorErrorPayload};
