//! Account domain models: balances and linked-item metadata

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::raw::to_raw;
use super::result::Result;
use crate::ports::models::{AccountType, ItemGetResponse, VendorAccount};

/// Balance snapshot for one account of a linked item
///
/// Created fresh on every balance fetch; nothing is cached between calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_id: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub account_subtype: Option<String>,
    /// Last digits of the account number, as masked by the vendor
    pub account_number: Option<String>,
    pub balance_current: Option<Decimal>,
    pub balance_available: Option<Decimal>,
    pub balance_limit: Option<Decimal>,
    pub currency_code: Option<String>,
    /// The vendor account object, verbatim
    pub raw_data: JsonValue,
}

impl AccountBalance {
    pub fn from_vendor(account: &VendorAccount) -> Result<Self> {
        Ok(Self {
            account_id: account.account_id.clone(),
            account_name: account.name.clone(),
            account_type: account.account_type.clone(),
            account_subtype: account.subtype.clone(),
            account_number: account.mask.clone(),
            balance_current: account.balances.current,
            balance_available: account.balances.available,
            balance_limit: account.balances.limit,
            currency_code: account
                .balances
                .iso_currency_code
                .clone()
                .or_else(|| account.balances.unofficial_currency_code.clone()),
            raw_data: to_raw(account)?,
        })
    }
}

/// Metadata of a linked item and its transaction refresh status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub item_id: String,
    pub institution_id: Option<String>,
    pub ts_consent_expiration: Option<DateTime<FixedOffset>>,
    pub ts_last_failed_update: Option<DateTime<FixedOffset>>,
    pub ts_last_successful_update: Option<DateTime<FixedOffset>>,
    /// The whole `/item/get` response, verbatim
    pub raw_data: JsonValue,
}

impl AccountInfo {
    pub fn from_vendor(response: &ItemGetResponse) -> Result<Self> {
        let tx_status = response
            .status
            .as_ref()
            .and_then(|s| s.transactions.as_ref());

        Ok(Self {
            item_id: response.item.item_id.clone(),
            institution_id: response.item.institution_id.clone(),
            ts_consent_expiration: response.item.consent_expiration_time,
            ts_last_failed_update: tx_status.and_then(|s| s.last_failed_update),
            ts_last_successful_update: tx_status.and_then(|s| s.last_successful_update),
            raw_data: to_raw(response)?,
        })
    }
}
