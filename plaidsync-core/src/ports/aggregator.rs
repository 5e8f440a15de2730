//! Aggregation API client port
//!
//! Defines the capability the adapter needs from the vendor: link-token
//! creation, token exchange, sandbox login reset, item metadata, balances and
//! the two transaction endpoints. The HTTP client in `adapters::plaid`
//! implements it; tests implement it with scripted doubles.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::models::{
    AccountsBalanceGetResponse, ItemGetResponse, ItemPublicTokenExchangeResponse,
    LinkTokenCreateRequest, LinkTokenCreateResponse, SandboxItemResetLoginResponse,
    TransactionsGetRequest, TransactionsGetResponse, TransactionsSyncRequest,
    TransactionsSyncResponse,
};

/// Structured error body returned by the vendor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorErrorPayload {
    #[serde(default)]
    pub error_type: Option<String>,
    pub error_code: String,
    pub error_message: String,
    #[serde(default)]
    pub display_message: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

impl fmt::Display for VendorErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_code, self.error_message)
    }
}

/// Failure reported by an [`AggregatorClient`]
///
/// Never leaves the crate: the adapter turns it into `domain::result::Error`.
#[derive(Error, Debug, Clone)]
pub enum VendorError {
    /// The vendor answered with an error payload
    #[error("HTTP {status}: {payload}")]
    Api {
        status: u16,
        payload: VendorErrorPayload,
    },

    /// The request never got an answer (connect, timeout, TLS)
    #[error("transport failure: {0}")]
    Transport(String),

    /// The vendor answered but the body could not be read
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl VendorError {
    /// Shorthand for an API error, mostly for test doubles
    pub fn api(error_code: impl Into<String>, error_message: impl Into<String>) -> Self {
        VendorError::Api {
            status: 400,
            payload: VendorErrorPayload {
                error_type: None,
                error_code: error_code.into(),
                error_message: error_message.into(),
                display_message: None,
                request_id: None,
            },
        }
    }
}

/// Vendor client capability
///
/// Implementations are not required to be thread-safe. `AggregatorAdapter`
/// is `Send`/`Sync` exactly when its client is.
pub trait AggregatorClient {
    /// `/link/token/create`
    fn link_token_create(
        &self,
        request: &LinkTokenCreateRequest,
    ) -> Result<LinkTokenCreateResponse, VendorError>;

    /// `/item/public_token/exchange`
    fn item_public_token_exchange(
        &self,
        public_token: &str,
    ) -> Result<ItemPublicTokenExchangeResponse, VendorError>;

    /// `/sandbox/item/reset_login` (sandbox environment only)
    fn sandbox_item_reset_login(
        &self,
        access_token: &str,
    ) -> Result<SandboxItemResetLoginResponse, VendorError>;

    /// `/item/get`
    fn item_get(&self, access_token: &str) -> Result<ItemGetResponse, VendorError>;

    /// `/accounts/balance/get`
    fn accounts_balance_get(
        &self,
        access_token: &str,
    ) -> Result<AccountsBalanceGetResponse, VendorError>;

    /// `/transactions/get`
    fn transactions_get(
        &self,
        request: &TransactionsGetRequest,
    ) -> Result<TransactionsGetResponse, VendorError>;

    /// `/transactions/sync`
    fn transactions_sync(
        &self,
        request: &TransactionsSyncRequest,
    ) -> Result<TransactionsSyncResponse, VendorError>;
}

impl<T: AggregatorClient + ?Sized> AggregatorClient for Box<T> {
    fn link_token_create(
        &self,
        request: &LinkTokenCreateRequest,
    ) -> Result<LinkTokenCreateResponse, VendorError> {
        (**self).link_token_create(request)
    }

    fn item_public_token_exchange(
        &self,
        public_token: &str,
    ) -> Result<ItemPublicTokenExchangeResponse, VendorError> {
        (**self).item_public_token_exchange(public_token)
    }

    fn sandbox_item_reset_login(
        &self,
        access_token: &str,
    ) -> Result<SandboxItemResetLoginResponse, VendorError> {
        (**self).sandbox_item_reset_login(access_token)
    }

    fn item_get(&self, access_token: &str) -> Result<ItemGetResponse, VendorError> {
        (**self).item_get(access_token)
    }

    fn accounts_balance_get(
        &self,
        access_token: &str,
    ) -> Result<AccountsBalanceGetResponse, VendorError> {
        (**self).accounts_balance_get(access_token)
    }

    fn transactions_get(
        &self,
        request: &TransactionsGetRequest,
    ) -> Result<TransactionsGetResponse, VendorError> {
        (**self).transactions_get(request)
    }

    fn transactions_sync(
        &self,
        request: &TransactionsSyncRequest,
    ) -> Result<TransactionsSyncResponse, VendorError> {
        (**self).transactions_sync(request)
    }
}
