//! Transactions command - fetch transactions in a date range

use std::time::Duration;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use indicatif::{ProgressBar, ProgressStyle};
use plaidsync_core::{Transaction, TransactionFetchMode, TransactionQuery};

use super::{get_adapter, load_config};
use crate::output::{self, format_amount};

const DEFAULT_DAYS: i64 = 30;

pub fn run(
    access_token: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    account_ids: Vec<String>,
    mode: Option<TransactionFetchMode>,
    json: bool,
) -> Result<()> {
    let mut config = load_config()?;
    if let Some(mode) = mode {
        config.options.transaction_mode = mode;
    }
    let adapter = get_adapter(&config)?;

    let end = end.unwrap_or_else(|| Local::now().date_naive());
    let start = start.unwrap_or(end - chrono::Duration::days(DEFAULT_DAYS));
    let mut query = TransactionQuery::new(access_token, start, end);
    if !account_ids.is_empty() {
        query = query.with_account_ids(account_ids);
    }

    let bar = fetch_spinner(json)?;
    let mut progress = |fetched: usize, total: Option<usize>| match total {
        Some(total) => bar.set_message(format!("Fetched {} of {} transactions", fetched, total)),
        None => bar.set_message(format!("Fetched {} transactions", fetched)),
    };
    let result = adapter.get_transactions(&query, Some(&mut progress));
    bar.finish_and_clear();
    let transactions = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&transactions)?);
        return Ok(());
    }

    output::info(&format!(
        "{} transactions from {} to {} ({} mode)",
        transactions.len(),
        start,
        end,
        config.options.transaction_mode
    ));
    if !transactions.is_empty() {
        println!("{}", transaction_table(&transactions));
    }

    Ok(())
}

/// Spinner shown on stderr while pages are fetched
pub fn fetch_spinner(hidden: bool) -> Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    bar.set_message("Fetching transactions");
    bar.enable_steady_tick(Duration::from_millis(100));
    Ok(bar)
}

pub fn transaction_table(transactions: &[Transaction]) -> comfy_table::Table {
    let mut table = output::create_table();
    table.set_header(vec![
        "Date", "Transaction ID", "Account ID", "Merchant", "Amount", "Currency", "Pending",
    ]);
    for tx in transactions {
        table.add_row(vec![
            tx.date.to_string(),
            tx.transaction_id.clone(),
            tx.account_id.clone(),
            tx.merchant_name.clone().unwrap_or_default(),
            format_amount(Some(tx.amount)),
            tx.currency_code.clone().unwrap_or_default(),
            if tx.pending { "yes" } else { "" }.to_string(),
        ]);
    }
    output::align_right(&mut table, &[4]);
    table
}
