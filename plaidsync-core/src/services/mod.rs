//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions.

mod aggregator;

pub use aggregator::{AggregatorAdapter, LinkSettings, ProgressCallback, TransactionQuery};
