//! Core domain records
//!
//! Plain value objects built from vendor responses. Each keeps the vendor
//! object it came from in `raw_data`.

mod account;
pub mod raw;
pub mod result;
mod transaction;

pub use account::{AccountBalance, AccountInfo};
pub use transaction::{Transaction, TransactionSync};
