//! Plaid API client
//!
//! Blocking HTTP client for the Plaid API. Every endpoint is a JSON `POST`
//! authenticated by `client_id` and `secret` in the request body.
//!
//! API Documentation: https://plaid.com/docs/api/

use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::config::PlaidConfig;
use crate::ports::models::{
    AccessTokenRequest, AccountsBalanceGetResponse, ItemGetResponse,
    ItemPublicTokenExchangeRequest, ItemPublicTokenExchangeResponse, LinkTokenCreateRequest,
    LinkTokenCreateResponse, SandboxItemResetLoginResponse, TransactionsGetRequest,
    TransactionsGetResponse, TransactionsSyncRequest, TransactionsSyncResponse,
};
use crate::ports::{AggregatorClient, VendorError, VendorErrorPayload};

/// API version pinned for every request
pub const PLAID_API_VERSION: &str = "2020-09-14";

/// Plaid API client
///
/// Safe to share between threads.
#[derive(Debug)]
pub struct PlaidClient {
    client: Client,
    base_url: String,
    client_id: String,
    secret: String,
    timeout_secs: u64,
}

impl PlaidClient {
    /// Create a client for the environment (or base URL override) in `config`
    pub fn new(config: &PlaidConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("Plaid-Version", HeaderValue::from_static(PLAID_API_VERSION));

        let timeout_secs = config.options.timeout_secs;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url(),
            client_id: config.client_id.clone(),
            secret: config.secret.clone(),
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` (plus credentials) to `path` and parse the answer
    fn post<B, T>(&self, path: &str, body: &B) -> std::result::Result<T, VendorError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("[Plaid] POST {}", url);

        let mut payload: Map<String, JsonValue> = match serde_json::to_value(body) {
            Ok(JsonValue::Object(map)) => map,
            Ok(_) => {
                return Err(VendorError::Transport(format!(
                    "Request body for {} is not a JSON object",
                    path
                )))
            }
            Err(e) => {
                return Err(VendorError::Transport(format!(
                    "Failed to encode request for {}: {}",
                    path, e
                )))
            }
        };
        payload.insert("client_id".to_string(), JsonValue::from(self.client_id.as_str()));
        payload.insert("secret".to_string(), JsonValue::from(self.secret.as_str()));

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .map_err(|e| self.map_request_error(e))?;

        self.parse_response(path, response)
    }

    /// Parse a response, turning non-2xx answers into vendor error payloads
    fn parse_response<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::blocking::Response,
    ) -> std::result::Result<T, VendorError> {
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| VendorError::Transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            debug!("[Plaid] {} answered HTTP {}", path, status.as_u16());
            return Err(match serde_json::from_str::<VendorErrorPayload>(&body) {
                Ok(payload) => VendorError::Api {
                    status: status.as_u16(),
                    payload,
                },
                Err(_) => VendorError::InvalidResponse(format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    body.chars().take(200).collect::<String>()
                )),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            VendorError::InvalidResponse(format!("Failed to parse {} response: {}", path, e))
        })
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> VendorError {
        if error.is_timeout() {
            VendorError::Transport(format!(
                "Connection timed out after {} seconds",
                self.timeout_secs
            ))
        } else if error.is_connect() {
            VendorError::Transport(format!("Unable to connect to {}", self.base_url))
        } else {
            VendorError::Transport(format!("Plaid request failed: {}", error))
        }
    }
}

impl AggregatorClient for PlaidClient {
    fn link_token_create(
        &self,
        request: &LinkTokenCreateRequest,
    ) -> std::result::Result<LinkTokenCreateResponse, VendorError> {
        self.post("/link/token/create", request)
    }

    fn item_public_token_exchange(
        &self,
        public_token: &str,
    ) -> std::result::Result<ItemPublicTokenExchangeResponse, VendorError> {
        let request = ItemPublicTokenExchangeRequest {
            public_token: public_token.to_string(),
        };
        self.post("/item/public_token/exchange", &request)
    }

    fn sandbox_item_reset_login(
        &self,
        access_token: &str,
    ) -> std::result::Result<SandboxItemResetLoginResponse, VendorError> {
        let request = AccessTokenRequest {
            access_token: access_token.to_string(),
        };
        self.post("/sandbox/item/reset_login", &request)
    }

    fn item_get(&self, access_token: &str) -> std::result::Result<ItemGetResponse, VendorError> {
        let request = AccessTokenRequest {
            access_token: access_token.to_string(),
        };
        self.post("/item/get", &request)
    }

    fn accounts_balance_get(
        &self,
        access_token: &str,
    ) -> std::result::Result<AccountsBalanceGetResponse, VendorError> {
        let request = AccessTokenRequest {
            access_token: access_token.to_string(),
        };
        self.post("/accounts/balance/get", &request)
    }

    fn transactions_get(
        &self,
        request: &TransactionsGetRequest,
    ) -> std::result::Result<TransactionsGetResponse, VendorError> {
        self.post("/transactions/get", request)
    }

    fn transactions_sync(
        &self,
        request: &TransactionsSyncRequest,
    ) -> std::result::Result<TransactionsSyncResponse, VendorError> {
        self.post("/transactions/sync", request)
    }
}
