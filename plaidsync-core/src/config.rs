//! Configuration management
//!
//! Settings live in `settings.json` inside the plaidsync directory:
//! ```json
//! {
//!   "plaid": {
//!     "clientId": "...",
//!     "secret": "...",
//!     "environment": "sandbox",
//!     "transactionMode": "sync"
//!   }
//! }
//! ```
//! Keys this crate does not manage are preserved when saving.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Settings file name inside the plaidsync directory
pub const SETTINGS_FILE: &str = "settings.json";

pub const CLIENT_ID_ENV: &str = "PLAIDSYNC_CLIENT_ID";
pub const SECRET_ENV: &str = "PLAIDSYNC_SECRET";
pub const ENVIRONMENT_ENV: &str = "PLAIDSYNC_ENV";

/// Overrides the vendor base URL (mock servers, proxies)
pub const BASE_URL_ENV: &str = "PLAID_BASE_URL";

/// Vendor page size bounds for both transaction endpoints
pub const MAX_PAGE_SIZE: usize = 500;

const DEFAULT_PAGE_SIZE: usize = 100;
const DEFAULT_MAX_PAGES: usize = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Vendor environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Sandbox,
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Sandbox => "sandbox",
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Default API base URL for this environment
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Sandbox => "https://sandbox.plaid.com",
            Environment::Development => "https://development.plaid.com",
            Environment::Production => "https://production.plaid.com",
        }
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sandbox" => Ok(Environment::Sandbox),
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            other => anyhow::bail!(
                "Unknown environment '{}'. Expected sandbox, development or production",
                other
            ),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How transaction history is paginated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionFetchMode {
    /// Cursor-based incremental sync
    #[default]
    Sync,
    /// Date-range fetch with offset paging (compatibility mode)
    Range,
}

impl FromStr for TransactionFetchMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sync" | "cursor" => Ok(TransactionFetchMode::Sync),
            "range" => Ok(TransactionFetchMode::Range),
            other => anyhow::bail!("Unknown transaction mode '{}'. Expected sync or range", other),
        }
    }
}

impl fmt::Display for TransactionFetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionFetchMode::Sync => f.write_str("sync"),
            TransactionFetchMode::Range => f.write_str("range"),
        }
    }
}

/// Behavior knobs of the adapter itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterOptions {
    pub transaction_mode: TransactionFetchMode,
    /// Transactions requested per page
    pub page_size: usize,
    /// Upper bound on pages fetched by one call
    pub max_pages: usize,
    pub timeout_secs: u64,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            transaction_mode: TransactionFetchMode::default(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AdapterOptions {
    /// Page size clamped to what the vendor accepts
    pub fn effective_page_size(&self) -> usize {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

// Raw settings.json structure

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    plaid: PlaidSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaidSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    environment: Option<Environment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    country_codes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transaction_mode: Option<TransactionFetchMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_pages: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Credentials, environment and link-token identity for the vendor API
#[derive(Clone)]
pub struct PlaidConfig {
    pub client_id: String,
    pub secret: String,
    pub environment: Environment,
    /// Application name shown in the link flow
    pub client_name: String,
    /// Stable identifier of the end user, required by link-token creation
    pub client_user_id: String,
    pub language: String,
    pub country_codes: Vec<String>,
    /// Overrides `environment.base_url()` when set
    pub base_url: Option<String>,
    pub options: AdapterOptions,
}

impl fmt::Debug for PlaidConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaidConfig")
            .field("client_id", &self.client_id)
            .field("secret", &"<redacted>")
            .field("environment", &self.environment)
            .field("client_name", &self.client_name)
            .field("client_user_id", &self.client_user_id)
            .field("language", &self.language)
            .field("country_codes", &self.country_codes)
            .field("base_url", &self.base_url)
            .field("options", &self.options)
            .finish()
    }
}

impl PlaidConfig {
    /// Config with default link-token identity and adapter options
    pub fn new(client_id: &str, secret: &str, environment: Environment) -> Self {
        Self {
            client_id: client_id.to_string(),
            secret: secret.to_string(),
            environment,
            client_name: "plaid-sync".to_string(),
            client_user_id: "abc123".to_string(),
            language: "en".to_string(),
            country_codes: vec!["US".to_string()],
            base_url: None,
            options: AdapterOptions::default(),
        }
    }

    /// Load config from the plaidsync directory
    ///
    /// Environment variables take precedence over the settings file:
    /// `PLAIDSYNC_CLIENT_ID`, `PLAIDSYNC_SECRET`, `PLAIDSYNC_ENV`, `PLAID_BASE_URL`.
    pub fn load(dir: &Path) -> Result<Self> {
        Self::load_with_env(dir, |key| std::env::var(key).ok())
    }

    fn load_with_env(dir: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::load_file(dir)?;

        if let Some(client_id) = env(CLIENT_ID_ENV) {
            config.client_id = client_id;
        }
        if let Some(secret) = env(SECRET_ENV) {
            config.secret = secret;
        }
        if let Some(value) = env(ENVIRONMENT_ENV) {
            config.environment = value.parse()?;
        }
        if let Some(base_url) = env(BASE_URL_ENV) {
            config.base_url = Some(base_url);
        }

        if config.client_id.is_empty() {
            anyhow::bail!(
                "Plaid client id not configured. Set plaid.clientId in {} or {}",
                SETTINGS_FILE,
                CLIENT_ID_ENV
            );
        }
        if config.secret.is_empty() {
            anyhow::bail!(
                "Plaid secret not configured. Set plaid.secret in {} or {}",
                SETTINGS_FILE,
                SECRET_ENV
            );
        }

        config.validate()?;
        Ok(config)
    }

    /// Settings exactly as stored in the file
    ///
    /// No environment overrides and no credential check, so the result can
    /// be edited and saved back. A missing file yields the defaults with
    /// empty credentials; an unreadable one is an error.
    pub fn load_file(dir: &Path) -> Result<Self> {
        let plaid = read_settings(&dir.join(SETTINGS_FILE))?.plaid;
        let mut config = Self::new(
            plaid.client_id.as_deref().unwrap_or(""),
            plaid.secret.as_deref().unwrap_or(""),
            plaid.environment.unwrap_or_default(),
        );

        if let Some(name) = plaid.client_name {
            config.client_name = name;
        }
        if let Some(user_id) = plaid.client_user_id {
            config.client_user_id = user_id;
        }
        if let Some(language) = plaid.language {
            config.language = language;
        }
        if let Some(codes) = plaid.country_codes {
            config.country_codes = codes;
        }
        config.base_url = plaid.base_url;

        if let Some(mode) = plaid.transaction_mode {
            config.options.transaction_mode = mode;
        }
        if let Some(page_size) = plaid.page_size {
            config.options.page_size = page_size;
        }
        if let Some(max_pages) = plaid.max_pages {
            config.options.max_pages = max_pages;
        }
        if let Some(timeout) = plaid.timeout_secs {
            config.options.timeout_secs = timeout;
        }

        Ok(config)
    }

    /// Save config to the plaidsync directory
    /// Preserves other settings that this crate doesn't manage
    pub fn save(&self, dir: &Path) -> Result<()> {
        let settings_path = dir.join(SETTINGS_FILE);
        let mut settings = read_settings(&settings_path)?;

        let plaid = &mut settings.plaid;
        plaid.client_id = Some(self.client_id.clone()).filter(|s| !s.is_empty());
        plaid.secret = Some(self.secret.clone()).filter(|s| !s.is_empty());
        plaid.environment = Some(self.environment);
        plaid.client_name = Some(self.client_name.clone());
        plaid.client_user_id = Some(self.client_user_id.clone());
        plaid.language = Some(self.language.clone());
        plaid.country_codes = Some(self.country_codes.clone());
        plaid.base_url = self.base_url.clone();
        plaid.transaction_mode = Some(self.options.transaction_mode);
        plaid.page_size = Some(self.options.page_size);
        plaid.max_pages = Some(self.options.max_pages);
        plaid.timeout_secs = Some(self.options.timeout_secs);

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)
            .with_context(|| format!("Failed to write {:?}", settings_path))?;
        Ok(())
    }

    /// API base URL in effect, without trailing slash
    pub fn api_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
            .trim_end_matches('/')
            .to_string()
    }

    /// Check the config can be used to talk to the vendor
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            anyhow::bail!("Plaid client id cannot be empty");
        }
        if self.secret.trim().is_empty() {
            anyhow::bail!("Plaid secret cannot be empty");
        }
        self.validate_settings()
    }

    /// Check everything except the credentials
    pub fn validate_settings(&self) -> Result<()> {
        if self.country_codes.is_empty() {
            anyhow::bail!("At least one country code is required");
        }
        if self.options.max_pages == 0 {
            anyhow::bail!("maxPages must be at least 1");
        }

        if let Some(base_url) = &self.base_url {
            let parsed = Url::parse(base_url).context("Invalid base URL format")?;
            if parsed.scheme() != "https" && parsed.scheme() != "http" {
                anyhow::bail!("Base URL must use http or https");
            }
        }

        Ok(())
    }
}

fn read_settings(path: &Path) -> Result<SettingsFile> {
    if !path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
}
