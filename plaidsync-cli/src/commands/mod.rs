//! CLI command implementations

pub mod balances;
pub mod config;
pub mod exchange;
pub mod item;
pub mod link;
pub mod reset;
pub mod sync;
pub mod transactions;

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use log::debug;
use plaidsync_core::{AggregatorAdapter, Error, PlaidClient, PlaidConfig};

use crate::output;

/// Get the plaidsync directory from environment or default
pub fn get_plaidsync_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("PLAIDSYNC_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".plaidsync"))
        .context("Could not find home directory. Set PLAIDSYNC_DIR instead")
}

/// Load settings, with environment overrides applied
pub fn load_config() -> Result<PlaidConfig> {
    let dir = get_plaidsync_dir()?;
    debug!("Loading settings from {:?}", dir);
    PlaidConfig::load(&dir).with_context(|| format!("Failed to load settings from {:?}", dir))
}

/// Build an adapter talking to the configured environment
pub fn get_adapter(config: &PlaidConfig) -> Result<AggregatorAdapter<PlaidClient>> {
    Ok(AggregatorAdapter::from_config(config)?)
}

/// Print an error, plus what to do about it when we know
pub fn report_error(err: &anyhow::Error) {
    output::error(&format!("Error: {:#}", err));

    let hint = match err.downcast_ref::<Error>() {
        Some(Error::AccountUpdateNeeded(_)) => Some(
            "The item needs re-authentication. Create an update-mode link with \
             'plaidsync link-token --access-token <token>' and complete the link flow.",
        ),
        Some(Error::NoApplicableAccounts(_)) => {
            Some("The institution has no accounts eligible for this operation.")
        }
        Some(Error::Pagination(_)) => {
            Some("The vendor did not finish paging. Try a shorter date range or '--mode range'.")
        }
        Some(Error::Config(_)) => {
            Some("Check your settings with 'plaidsync config show'.")
        }
        _ => None,
    };

    if let Some(hint) = hint {
        eprintln!("{}", hint.dimmed());
    }
}
