//! Plaidsync Core - typed adapter over the Plaid aggregation API
//!
//! This crate follows a hexagonal layout:
//!
//! - **domain**: Records built from vendor responses (AccountBalance, Transaction, etc.)
//!   and the error classification
//! - **ports**: The `AggregatorClient` capability and the vendor wire models
//! - **services**: `AggregatorAdapter`, the operations callers use
//! - **adapters**: Concrete implementations (Plaid HTTP client)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export commonly used types at crate root
pub use adapters::plaid::PlaidClient;
pub use config::{AdapterOptions, Environment, PlaidConfig, TransactionFetchMode};
pub use domain::result::{AggregatorFailure, Error, Result};
pub use domain::{AccountBalance, AccountInfo, Transaction, TransactionSync};
pub use ports::{AggregatorClient, VendorError, VendorErrorPayload};
pub use services::{AggregatorAdapter, LinkSettings, ProgressCallback, TransactionQuery};
