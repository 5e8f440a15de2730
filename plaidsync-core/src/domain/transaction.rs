//! Transaction domain model

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::raw::to_raw;
use super::result::Result;
use crate::ports::models::VendorTransaction;

/// A single transaction as reported by the vendor
///
/// Identity is the vendor's `transaction_id`. Repeated fetches can return the
/// same transaction again; callers de-duplicate on that id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub account_id: String,
    pub transaction_id: String,
    pub date: NaiveDate,
    pub pending: bool,
    pub merchant_name: Option<String>,
    /// Signed amount; positive values are money leaving the account
    pub amount: Decimal,
    pub currency_code: Option<String>,
    /// The vendor transaction object, verbatim
    pub raw_data: JsonValue,
}

impl Transaction {
    pub fn from_vendor(tx: &VendorTransaction) -> Result<Self> {
        Ok(Self {
            account_id: tx.account_id.clone(),
            transaction_id: tx.transaction_id.clone(),
            date: tx.date,
            pending: tx.pending,
            merchant_name: tx.merchant_name.clone(),
            amount: tx.amount,
            currency_code: tx
                .iso_currency_code
                .clone()
                .or_else(|| tx.unofficial_currency_code.clone()),
            raw_data: to_raw(tx)?,
        })
    }

    /// Whether this transaction falls inside `[start, end]`
    pub fn is_within(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.date >= start && self.date <= end
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} - {:.2} {}",
            self.date,
            self.transaction_id,
            self.merchant_name.as_deref().unwrap_or("None"),
            self.amount,
            self.currency_code.as_deref().unwrap_or("None"),
        )
    }
}

/// Everything an incremental sync reported, page results merged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionSync {
    pub added: Vec<Transaction>,
    pub modified: Vec<Transaction>,
    /// Ids of transactions the vendor no longer reports
    pub removed: Vec<String>,
    /// Cursor to pass to the next sync to receive only later changes
    pub next_cursor: String,
}

impl TransactionSync {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}
