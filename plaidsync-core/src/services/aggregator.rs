//! Aggregator adapter - typed operations over the aggregation API
//!
//! Each operation builds a vendor request from typed inputs, calls the
//! vendor client, maps the response into domain records and classifies any
//! vendor failure into `Error::{NoApplicableAccounts, AccountUpdateNeeded,
//! UnknownAggregator}`. Calls are sequential and blocking; no retries.

use chrono::NaiveDate;
use log::{debug, info, warn};

use crate::adapters::plaid::PlaidClient;
use crate::config::{AdapterOptions, PlaidConfig, TransactionFetchMode};
use crate::domain::result::{Error, Result};
use crate::domain::{AccountBalance, AccountInfo, Transaction, TransactionSync};
use crate::ports::models::{
    LinkTokenCreateRequest, LinkTokenUser, Product, TransactionsGetOptions,
    TransactionsGetRequest, TransactionsSyncRequest,
};
use crate::ports::{AggregatorClient, VendorError};

/// Progress hook for transaction fetches: `(fetched so far, total if known)`
pub type ProgressCallback<'a> = &'a mut dyn FnMut(usize, Option<usize>);

/// Identity sent with every link-token request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSettings {
    pub client_name: String,
    pub client_user_id: String,
    pub language: String,
    pub country_codes: Vec<String>,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            client_name: "plaid-sync".to_string(),
            client_user_id: "abc123".to_string(),
            language: "en".to_string(),
            country_codes: vec!["US".to_string()],
        }
    }
}

impl LinkSettings {
    pub fn from_config(config: &PlaidConfig) -> Self {
        Self {
            client_name: config.client_name.clone(),
            client_user_id: config.client_user_id.clone(),
            language: config.language.clone(),
            country_codes: config.country_codes.clone(),
        }
    }
}

/// Parameters of a transaction fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
    pub access_token: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Only keep transactions of these accounts (`None` or empty = all)
    pub account_ids: Option<Vec<String>>,
}

impl TransactionQuery {
    pub fn new(access_token: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            access_token: access_token.into(),
            start_date,
            end_date,
            account_ids: None,
        }
    }

    /// Restrict the fetch to the given accounts
    pub fn with_account_ids(mut self, account_ids: Vec<String>) -> Self {
        self.account_ids = Some(account_ids);
        self
    }

    fn account_filter(&self) -> Option<&[String]> {
        self.account_ids.as_deref().filter(|ids| !ids.is_empty())
    }

    fn matches_account(&self, tx: &Transaction) -> bool {
        self.account_filter()
            .map_or(true, |ids| ids.iter().any(|id| *id == tx.account_id))
    }

    fn validate(&self) -> Result<()> {
        require_token("access token", &self.access_token)?;
        if self.start_date > self.end_date {
            return Err(Error::validation(format!(
                "start date {} is after end date {}",
                self.start_date, self.end_date
            )));
        }
        Ok(())
    }
}

fn require_token(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{} cannot be empty", name)));
    }
    Ok(())
}

/// Adapter over an aggregation API client
///
/// Owns its client for its whole lifetime. The adapter holds no mutable
/// state, so it is `Send`/`Sync` exactly when `C` is: share it across
/// threads only if the client is thread-safe. [`PlaidClient`] is.
pub struct AggregatorAdapter<C> {
    client: C,
    link: LinkSettings,
    options: AdapterOptions,
}

impl AggregatorAdapter<PlaidClient> {
    /// Build an adapter talking HTTP to the environment in `config`
    pub fn from_config(config: &PlaidConfig) -> Result<Self> {
        let client = PlaidClient::new(config).map_err(|e| Error::config(e.to_string()))?;
        info!(
            "[Aggregator] Using {} environment at {}",
            config.environment,
            client.base_url()
        );
        Ok(Self::with_client(client, config.options.clone())
            .with_link_settings(LinkSettings::from_config(config)))
    }
}

impl<C: AggregatorClient> AggregatorAdapter<C> {
    /// Wrap any conforming client (real vendor or test double)
    pub fn with_client(client: C, options: AdapterOptions) -> Self {
        Self {
            client,
            link: LinkSettings::default(),
            options,
        }
    }

    pub fn with_link_settings(mut self, link: LinkSettings) -> Self {
        self.link = link;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }

    /// Route a vendor call through error classification
    fn call<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&C) -> std::result::Result<T, VendorError>,
    ) -> Result<T> {
        debug!("[Aggregator] {}", operation);
        f(&self.client).map_err(|e| {
            let err = Error::from_vendor(e);
            warn!("[Aggregator] {} failed: {}", operation, err);
            err
        })
    }

    /// Build the link-token request for a new link or an update-mode link
    ///
    /// Without an access token the request asks for the `transactions`
    /// product; with one it names the existing item and carries no product
    /// scope, since the vendor rejects the combination.
    pub fn build_link_token_request(&self, access_token: Option<&str>) -> LinkTokenCreateRequest {
        let (products, access_token) = match access_token {
            Some(token) => (None, Some(token.to_string())),
            None => (Some(vec![Product::Transactions]), None),
        };

        LinkTokenCreateRequest {
            client_name: self.link.client_name.clone(),
            language: self.link.language.clone(),
            country_codes: self.link.country_codes.clone(),
            user: LinkTokenUser {
                client_user_id: self.link.client_user_id.clone(),
            },
            products,
            access_token,
        }
    }

    /// Create a link token, for a new link or to re-authenticate an existing item
    pub fn get_link_token(&self, access_token: Option<&str>) -> Result<String> {
        if let Some(token) = access_token {
            require_token("access token", token)?;
        }

        let request = self.build_link_token_request(access_token);
        let response = self.call("link_token_create", |c| c.link_token_create(&request))?;

        info!(
            "[Aggregator] Created {} link token",
            if access_token.is_some() { "update-mode" } else { "new" }
        );
        Ok(response.link_token)
    }

    /// Exchange a short-lived public token for a long-lived access token
    ///
    /// The access token identifies the item from now on; store it securely.
    pub fn exchange_public_token(&self, public_token: &str) -> Result<String> {
        require_token("public token", public_token)?;

        let response = self.call("item_public_token_exchange", |c| {
            c.item_public_token_exchange(public_token)
        })?;

        info!(
            "[Aggregator] Exchanged public token for item {}",
            response.item_id.as_deref().unwrap_or("<unknown>")
        );
        Ok(response.access_token)
    }

    /// Force an item into the "login required" state (sandbox only)
    ///
    /// Outside the sandbox the vendor rejects this call, which surfaces as
    /// `Error::UnknownAggregator`.
    pub fn sandbox_reset_login(&self, access_token: &str) -> Result<bool> {
        require_token("access token", access_token)?;

        let response = self.call("sandbox_item_reset_login", |c| {
            c.sandbox_item_reset_login(access_token)
        })?;
        Ok(response.reset_login)
    }

    /// Metadata of the item behind `access_token`
    ///
    /// Fails with `Error::AccountUpdateNeeded` when the item's login expired.
    pub fn get_item_info(&self, access_token: &str) -> Result<AccountInfo> {
        require_token("access token", access_token)?;

        let response = self.call("item_get", |c| c.item_get(access_token))?;
        AccountInfo::from_vendor(&response)
    }

    /// Balances of every account of the item, in vendor order
    ///
    /// Fails with `Error::NoApplicableAccounts` when the item has no eligible account.
    pub fn get_account_balances(&self, access_token: &str) -> Result<Vec<AccountBalance>> {
        require_token("access token", access_token)?;

        let response = self.call("accounts_balance_get", |c| c.accounts_balance_get(access_token))?;
        let balances = response
            .accounts
            .iter()
            .map(AccountBalance::from_vendor)
            .collect::<Result<Vec<_>>>()?;

        info!("[Aggregator] Fetched {} account balances", balances.len());
        Ok(balances)
    }

    /// Transactions in `[start_date, end_date]`, paginated per the configured mode
    ///
    /// In sync mode only newly-added transactions are returned; use
    /// [`sync_transactions`](Self::sync_transactions) to also see modified and
    /// removed ones. A failure on any page discards everything fetched so far.
    pub fn get_transactions(
        &self,
        query: &TransactionQuery,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<Vec<Transaction>> {
        match self.options.transaction_mode {
            TransactionFetchMode::Range => self.get_transactions_range(query, progress),
            TransactionFetchMode::Sync => {
                query.validate()?;

                let sync = self.sync_transactions(&query.access_token, None, progress)?;
                if !sync.modified.is_empty() || !sync.removed.is_empty() {
                    debug!(
                        "[Aggregator] Dropping {} modified and {} removed transactions",
                        sync.modified.len(),
                        sync.removed.len()
                    );
                }

                let added = sync.added.len();
                let transactions: Vec<Transaction> = sync
                    .added
                    .into_iter()
                    .filter(|tx| tx.is_within(query.start_date, query.end_date))
                    .filter(|tx| query.matches_account(tx))
                    .collect();

                if transactions.len() < added {
                    debug!(
                        "[Aggregator] Filtered {} of {} transactions outside the requested range or accounts",
                        added - transactions.len(),
                        added
                    );
                }
                Ok(transactions)
            }
        }
    }

    /// Date-range fetch, paging by offset until the vendor's total is reached
    pub fn get_transactions_range(
        &self,
        query: &TransactionQuery,
        mut progress: Option<ProgressCallback<'_>>,
    ) -> Result<Vec<Transaction>> {
        query.validate()?;

        let page_size = self.options.effective_page_size();
        let account_ids = query.account_filter().map(|ids| ids.to_vec());
        let mut transactions = Vec::new();
        let mut fetched = 0usize;
        let mut pages = 0usize;

        loop {
            if pages >= self.options.max_pages {
                return Err(Error::Pagination(format!(
                    "Stopped after {} pages with {} transactions fetched",
                    pages, fetched
                )));
            }

            let request = TransactionsGetRequest {
                access_token: query.access_token.clone(),
                start_date: query.start_date,
                end_date: query.end_date,
                options: TransactionsGetOptions {
                    count: page_size,
                    offset: fetched,
                    account_ids: account_ids.clone(),
                },
            };
            let response = self.call("transactions_get", |c| c.transactions_get(&request))?;
            pages += 1;

            let page_len = response.transactions.len();
            fetched += page_len;
            for vendor_tx in &response.transactions {
                let tx = Transaction::from_vendor(vendor_tx)?;
                if query.matches_account(&tx) {
                    transactions.push(tx);
                }
            }

            let total = response.total_transactions;
            if let Some(report) = progress.as_deref_mut() {
                report(fetched, Some(total));
            }

            if fetched >= total {
                break;
            }
            if page_len == 0 {
                return Err(Error::Pagination(format!(
                    "Vendor returned an empty page at offset {} of {}",
                    fetched, total
                )));
            }
        }

        info!(
            "[Aggregator] Fetched {} transactions in {} pages",
            transactions.len(),
            pages
        );
        Ok(transactions)
    }

    /// Incremental cursor sync
    ///
    /// Starts from `cursor` (or from the beginning of history when `None`)
    /// and follows `has_more` until the vendor reports no further pages.
    /// Pass the returned `next_cursor` to the next call to receive only
    /// later changes.
    pub fn sync_transactions(
        &self,
        access_token: &str,
        cursor: Option<&str>,
        mut progress: Option<ProgressCallback<'_>>,
    ) -> Result<TransactionSync> {
        require_token("access token", access_token)?;

        let page_size = self.options.effective_page_size();
        let mut cursor = cursor.filter(|c| !c.is_empty()).map(str::to_string);
        let mut sync = TransactionSync::default();
        let mut pages = 0usize;

        loop {
            if pages >= self.options.max_pages {
                return Err(Error::Pagination(format!(
                    "Stopped after {} sync pages with more pending",
                    pages
                )));
            }

            let request = TransactionsSyncRequest {
                access_token: access_token.to_string(),
                cursor: cursor.clone(),
                count: page_size,
            };
            let response = self.call("transactions_sync", |c| c.transactions_sync(&request))?;
            pages += 1;

            // More pending, nothing delivered and the same cursor: the next request would repeat this one
            let unchanged = response.added.is_empty()
                && response.modified.is_empty()
                && response.removed.is_empty();
            if response.has_more && unchanged && cursor.as_deref() == Some(response.next_cursor.as_str()) {
                return Err(Error::Pagination(format!(
                    "Sync cursor {} did not advance after {} pages",
                    response.next_cursor, pages
                )));
            }

            for vendor_tx in &response.added {
                sync.added.push(Transaction::from_vendor(vendor_tx)?);
            }
            for vendor_tx in &response.modified {
                sync.modified.push(Transaction::from_vendor(vendor_tx)?);
            }
            sync.removed
                .extend(response.removed.iter().map(|r| r.transaction_id.clone()));

            if let Some(report) = progress.as_deref_mut() {
                report(sync.added.len(), None);
            }

            cursor = Some(response.next_cursor.clone());
            sync.next_cursor = response.next_cursor;

            if !response.has_more {
                break;
            }
        }

        info!(
            "[Aggregator] Synced {} added, {} modified, {} removed in {} pages",
            sync.added.len(),
            sync.modified.len(),
            sync.removed.len(),
            pages
        );
        Ok(sync)
    }
}
