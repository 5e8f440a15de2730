//! Exchange command - trade a public token for a long-lived access token

use anyhow::Result;
use colored::Colorize;
use dialoguer::Input;

use super::{get_adapter, load_config};
use crate::output;

pub fn run(public_token: Option<String>, json: bool) -> Result<()> {
    let config = load_config()?;
    let adapter = get_adapter(&config)?;

    let public_token = match public_token {
        Some(t) => t,
        None => Input::new()
            .with_prompt("Public token from the link flow")
            .interact_text()?,
    };

    let access_token = adapter.exchange_public_token(public_token.trim())?;

    if json {
        let result = serde_json::json!({ "access_token": access_token });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    output::success("Public token exchanged");
    println!("{} {}", "Access token:".bold(), access_token);
    println!(
        "{}",
        "Store it securely and pass it with --access-token or PLAIDSYNC_ACCESS_TOKEN.".dimmed()
    );

    Ok(())
}
