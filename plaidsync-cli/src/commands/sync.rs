//! Sync command - incremental cursor sync with full change detail

use anyhow::Result;
use colored::Colorize;

use super::transactions::{fetch_spinner, transaction_table};
use super::{get_adapter, load_config};

pub fn run(access_token: &str, cursor: Option<&str>, json: bool) -> Result<()> {
    let config = load_config()?;
    let adapter = get_adapter(&config)?;

    let bar = fetch_spinner(json)?;
    let mut progress = |fetched: usize, _total: Option<usize>| {
        bar.set_message(format!("Synced {} new transactions", fetched))
    };
    let result = adapter.sync_transactions(access_token, cursor, Some(&mut progress));
    bar.finish_and_clear();
    let sync = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sync)?);
        return Ok(());
    }

    if sync.is_empty() {
        println!("{}", "No changes since the last sync".dimmed());
    } else {
        println!("{} {}", "Added:".green(), sync.added.len());
        if !sync.added.is_empty() {
            println!("{}", transaction_table(&sync.added));
        }
        println!("{} {}", "Modified:".yellow(), sync.modified.len());
        if !sync.modified.is_empty() {
            println!("{}", transaction_table(&sync.modified));
        }
        println!("{} {}", "Removed:".red(), sync.removed.len());
        for id in &sync.removed {
            println!("  {}", id);
        }
    }

    println!();
    println!("{} {}", "Next cursor:".bold(), sync.next_cursor);
    println!("{}", "Pass it with --cursor to receive only later changes.".dimmed());

    Ok(())
}
