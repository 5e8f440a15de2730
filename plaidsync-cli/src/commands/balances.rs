//! Balances command - list account balances of a linked item

use anyhow::Result;

use super::{get_adapter, load_config};
use crate::output::{self, format_amount};

pub fn run(access_token: &str, json: bool) -> Result<()> {
    let config = load_config()?;
    let adapter = get_adapter(&config)?;
    let balances = adapter.get_account_balances(access_token)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&balances)?);
        return Ok(());
    }

    if balances.is_empty() {
        output::warning("No accounts found for this item.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec![
        "Account ID", "Name", "Type", "Subtype", "Mask", "Current", "Available", "Limit", "Currency",
    ]);
    for balance in &balances {
        table.add_row(vec![
            balance.account_id.clone(),
            balance.account_name.clone(),
            balance.account_type.to_string(),
            balance.account_subtype.clone().unwrap_or_default(),
            balance.account_number.clone().unwrap_or_default(),
            format_amount(balance.balance_current),
            format_amount(balance.balance_available),
            format_amount(balance.balance_limit),
            balance.currency_code.clone().unwrap_or_default(),
        ]);
    }
    output::align_right(&mut table, &[5, 6, 7]);
    println!("{}", table);

    Ok(())
}
