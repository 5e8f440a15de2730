//! Item command - show metadata of a linked item

use anyhow::Result;
use colored::Colorize;

use super::{get_adapter, load_config};
use crate::output::{self, format_timestamp};

pub fn run(access_token: &str, json: bool) -> Result<()> {
    let config = load_config()?;
    let adapter = get_adapter(&config)?;
    let info = adapter.get_item_info(access_token)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", "Linked Item".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Item ID", info.item_id.as_str()]);
    table.add_row(vec!["Institution", info.institution_id.as_deref().unwrap_or("-")]);
    table.add_row(vec![
        "Consent expires".to_string(),
        format_timestamp(info.ts_consent_expiration),
    ]);
    table.add_row(vec![
        "Last successful update".to_string(),
        format_timestamp(info.ts_last_successful_update),
    ]);
    table.add_row(vec![
        "Last failed update".to_string(),
        format_timestamp(info.ts_last_failed_update),
    ]);
    println!("{}", table);

    Ok(())
}
