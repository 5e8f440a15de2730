//! Vendor wire models
//!
//! Request and response shapes of the aggregation API. Responses keep any
//! field we do not model in a flattened `extra` map, so serializing one back
//! (see `domain::raw`) loses nothing.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::domain::raw::{amount, amount_option, timestamp_option};

// =============================================================================
// Enumerated vendor fields
// =============================================================================

/// Account type tag (`depository`, `credit`, ...)
///
/// Unknown values are kept as `Other` so they survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AccountType {
    Depository,
    Credit,
    Loan,
    Investment,
    Brokerage,
    Other(String),
}

impl AccountType {
    pub fn as_str(&self) -> &str {
        match self {
            AccountType::Depository => "depository",
            AccountType::Credit => "credit",
            AccountType::Loan => "loan",
            AccountType::Investment => "investment",
            AccountType::Brokerage => "brokerage",
            AccountType::Other(s) => s,
        }
    }
}

impl From<String> for AccountType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "depository" => AccountType::Depository,
            "credit" => AccountType::Credit,
            "loan" => AccountType::Loan,
            "investment" => AccountType::Investment,
            "brokerage" => AccountType::Brokerage,
            _ => AccountType::Other(s),
        }
    }
}

impl From<AccountType> for String {
    fn from(t: AccountType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a transaction was made (`online`, `in store`, `other`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentChannel {
    Online,
    InStore,
    Other(String),
}

impl PaymentChannel {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentChannel::Online => "online",
            PaymentChannel::InStore => "in store",
            PaymentChannel::Other(s) => s,
        }
    }
}

impl From<String> for PaymentChannel {
    fn from(s: String) -> Self {
        match s.as_str() {
            "online" => PaymentChannel::Online,
            "in store" => PaymentChannel::InStore,
            _ => PaymentChannel::Other(s),
        }
    }
}

impl From<PaymentChannel> for String {
    fn from(c: PaymentChannel) -> Self {
        c.as_str().to_string()
    }
}

/// Product scope requested when creating a link token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Product {
    Transactions,
    Auth,
    Balance,
    Identity,
    Other(String),
}

impl Product {
    pub fn as_str(&self) -> &str {
        match self {
            Product::Transactions => "transactions",
            Product::Auth => "auth",
            Product::Balance => "balance",
            Product::Identity => "identity",
            Product::Other(s) => s,
        }
    }
}

impl From<String> for Product {
    fn from(s: String) -> Self {
        match s.as_str() {
            "transactions" => Product::Transactions,
            "auth" => Product::Auth,
            "balance" => Product::Balance,
            "identity" => Product::Identity,
            _ => Product::Other(s),
        }
    }
}

impl From<Product> for String {
    fn from(p: Product) -> Self {
        p.as_str().to_string()
    }
}

// =============================================================================
// Link token
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTokenUser {
    pub client_user_id: String,
}

/// `/link/token/create` request
///
/// `products` and `access_token` are mutually exclusive: a new link asks for
/// a product scope, an update-mode link names the existing item instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTokenCreateRequest {
    pub client_name: String,
    pub language: String,
    pub country_codes: Vec<String>,
    pub user: LinkTokenUser,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<Product>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkTokenCreateResponse {
    pub link_token: String,
    #[serde(default, with = "timestamp_option")]
    pub expiration: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub request_id: Option<String>,
}

// =============================================================================
// Token exchange / sandbox
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemPublicTokenExchangeRequest {
    pub public_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemPublicTokenExchangeResponse {
    pub access_token: String,
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Body shared by every endpoint that only needs the item's access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenRequest {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxItemResetLoginResponse {
    pub reset_login: bool,
    #[serde(default)]
    pub request_id: Option<String>,
}

// =============================================================================
// Item
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemGetResponse {
    pub item: Item,
    #[serde(default)]
    pub status: Option<ItemStatus>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// A linked institution connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub item_id: String,
    #[serde(default)]
    pub institution_id: Option<String>,
    #[serde(default, with = "timestamp_option")]
    pub consent_expiration_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub available_products: Vec<Product>,
    #[serde(default)]
    pub billed_products: Vec<Product>,
    #[serde(default)]
    pub webhook: Option<String>,
    #[serde(default)]
    pub update_type: Option<String>,
    #[serde(default)]
    pub error: Option<JsonValue>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemStatus {
    #[serde(default)]
    pub transactions: Option<ItemTransactionsStatus>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemTransactionsStatus {
    #[serde(default, with = "timestamp_option")]
    pub last_successful_update: Option<DateTime<FixedOffset>>,
    #[serde(default, with = "timestamp_option")]
    pub last_failed_update: Option<DateTime<FixedOffset>>,
}

// =============================================================================
// Accounts / balances
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsBalanceGetResponse {
    #[serde(default)]
    pub accounts: Vec<VendorAccount>,
    #[serde(default)]
    pub item: Option<JsonValue>,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorAccount {
    pub account_id: String,
    pub name: String,
    #[serde(default)]
    pub official_name: Option<String>,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub mask: Option<String>,
    pub balances: VendorBalances,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorBalances {
    #[serde(default, with = "amount_option")]
    pub current: Option<Decimal>,
    #[serde(default, with = "amount_option")]
    pub available: Option<Decimal>,
    #[serde(default, with = "amount_option")]
    pub limit: Option<Decimal>,
    #[serde(default)]
    pub iso_currency_code: Option<String>,
    #[serde(default)]
    pub unofficial_currency_code: Option<String>,
    #[serde(default, with = "timestamp_option")]
    pub last_updated_datetime: Option<DateTime<FixedOffset>>,
}

// =============================================================================
// Transactions
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionsGetOptions {
    pub count: usize,
    pub offset: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_ids: Option<Vec<String>>,
}

/// `/transactions/get` request (date-range pagination)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionsGetRequest {
    pub access_token: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub options: TransactionsGetOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionsGetResponse {
    #[serde(default)]
    pub transactions: Vec<VendorTransaction>,
    pub total_transactions: usize,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// `/transactions/sync` request (cursor pagination)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionsSyncRequest {
    pub access_token: String,
    /// Absent on the very first sync of an item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionsSyncResponse {
    #[serde(default)]
    pub added: Vec<VendorTransaction>,
    #[serde(default)]
    pub modified: Vec<VendorTransaction>,
    #[serde(default)]
    pub removed: Vec<RemovedTransaction>,
    pub next_cursor: String,
    pub has_more: bool,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovedTransaction {
    pub transaction_id: String,
    #[serde(default)]
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorTransaction {
    pub transaction_id: String,
    pub account_id: String,
    /// Positive values are money leaving the account
    #[serde(with = "amount")]
    pub amount: Decimal,
    #[serde(default)]
    pub iso_currency_code: Option<String>,
    #[serde(default)]
    pub unofficial_currency_code: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub authorized_date: Option<NaiveDate>,
    #[serde(default, with = "timestamp_option")]
    pub datetime: Option<DateTime<FixedOffset>>,
    #[serde(default, with = "timestamp_option")]
    pub authorized_datetime: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub merchant_name: Option<String>,
    #[serde(default)]
    pub payment_channel: Option<PaymentChannel>,
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub pending_transaction_id: Option<String>,
    #[serde(default)]
    pub category: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}
