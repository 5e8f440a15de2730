//! Link-token command - start a new link or re-authenticate an item

use anyhow::Result;
use colored::Colorize;

use super::{get_adapter, load_config};

pub fn run(access_token: Option<&str>, json: bool) -> Result<()> {
    let config = load_config()?;
    let adapter = get_adapter(&config)?;
    let link_token = adapter.get_link_token(access_token)?;

    if json {
        let result = serde_json::json!({
            "link_token": link_token,
            "update_mode": access_token.is_some(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{} {}", "Link token:".bold(), link_token);
    if access_token.is_some() {
        println!("Open the link flow with this token to re-authenticate the item.");
    } else {
        println!("Open the link flow with this token, then run 'plaidsync exchange <public-token>'.");
    }

    Ok(())
}
