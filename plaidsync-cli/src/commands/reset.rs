//! Reset-login command - put a sandbox item into the login-required state

use anyhow::Result;
use colored::Colorize;
use dialoguer::Confirm;
use plaidsync_core::Environment;

use super::{get_adapter, load_config};
use crate::output;

pub fn run(access_token: &str, force: bool) -> Result<()> {
    let config = load_config()?;

    if config.environment != Environment::Sandbox {
        output::warning(&format!(
            "Login reset only exists in the sandbox; the {} environment will reject it.",
            config.environment
        ));
    }

    if !force {
        println!(
            "\n{}",
            "This will invalidate the item's login until it is re-linked.".yellow()
        );
        if !Confirm::new()
            .with_prompt("Are you sure?")
            .default(false)
            .interact()?
        {
            println!("{}\n", "Cancelled".dimmed());
            return Ok(());
        }
    }

    let adapter = get_adapter(&config)?;
    if adapter.sandbox_reset_login(access_token)? {
        output::success("Item login reset. The next data call will need re-authentication.");
    } else {
        output::warning("The vendor did not reset the item login.");
    }

    Ok(())
}
