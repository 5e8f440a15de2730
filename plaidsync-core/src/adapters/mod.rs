//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Plaid HTTP client for AggregatorClient
//! - Mock Plaid server for end-to-end tests

pub mod plaid;

#[cfg(test)]
pub mod plaid_mock;
