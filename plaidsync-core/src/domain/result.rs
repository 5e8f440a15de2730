//! Result and error types for the core library

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::VendorError;

/// Vendor error code for "no eligible accounts"
pub const NO_ACCOUNTS: &str = "NO_ACCOUNTS";

/// Vendor error code for "item needs re-authentication"
pub const ITEM_LOGIN_REQUIRED: &str = "ITEM_LOGIN_REQUIRED";

/// Code used when the vendor could not be reached at all
pub const TRANSPORT_ERROR: &str = "TRANSPORT_ERROR";

/// Code used when the vendor answered with a body we could not read
pub const INVALID_RESPONSE: &str = "INVALID_RESPONSE";

/// Error code and message carried verbatim from the vendor's error payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorFailure {
    pub error_code: String,
    pub error_message: String,
}

impl AggregatorFailure {
    pub fn new(error_code: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            error_message: error_message.into(),
        }
    }
}

impl fmt::Display for AggregatorFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_code, self.error_message)
    }
}

/// Core library error type
///
/// The first three variants are the only shapes a vendor failure can take
/// once it crosses the adapter boundary.
#[derive(Error, Debug)]
pub enum Error {
    /// No eligible accounts for the requested operation
    #[error("No applicable accounts: {0}")]
    NoApplicableAccounts(AggregatorFailure),

    /// The linked item must be re-authenticated through update-mode link
    #[error("Account update needed: {0}")]
    AccountUpdateNeeded(AggregatorFailure),

    #[error("Aggregator error: {0}")]
    UnknownAggregator(AggregatorFailure),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Pagination stopped before the vendor signalled completion
    #[error("Pagination error: {0}")]
    Pagination(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Classify a vendor failure into one of the three domain kinds
    pub fn from_vendor(error: VendorError) -> Self {
        let failure = match error {
            VendorError::Api { payload, .. } => {
                AggregatorFailure::new(payload.error_code, payload.error_message)
            }
            VendorError::Transport(msg) => AggregatorFailure::new(TRANSPORT_ERROR, msg),
            VendorError::InvalidResponse(msg) => AggregatorFailure::new(INVALID_RESPONSE, msg),
        };

        match failure.error_code.as_str() {
            NO_ACCOUNTS => Self::NoApplicableAccounts(failure),
            ITEM_LOGIN_REQUIRED => Self::AccountUpdateNeeded(failure),
            _ => Self::UnknownAggregator(failure),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Vendor code and message, for the three aggregator kinds
    pub fn aggregator_failure(&self) -> Option<&AggregatorFailure> {
        match self {
            Self::NoApplicableAccounts(f)
            | Self::AccountUpdateNeeded(f)
            | Self::UnknownAggregator(f) => Some(f),
            _ => None,
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        self.aggregator_failure().map(|f| f.error_code.as_str())
    }

    pub fn error_message(&self) -> Option<&str> {
        self.aggregator_failure().map(|f| f.error_message.as_str())
    }

    /// True when the caller can act on the error (pick another account type, re-link)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NoApplicableAccounts(_) | Self::AccountUpdateNeeded(_)
        )
    }
}

impl From<VendorError> for Error {
    fn from(error: VendorError) -> Self {
        Self::from_vendor(error)
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
