//! Config command - show and change settings

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use plaidsync_core::{Environment, PlaidConfig, TransactionFetchMode};

use super::{get_plaidsync_dir, load_config};
use crate::output::{self, mask_secret};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the settings in effect (environment overrides applied)
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change settings
    Set {
        #[arg(long)]
        client_id: Option<String>,
        #[arg(long)]
        secret: Option<String>,
        #[arg(long)]
        environment: Option<Environment>,
        /// Default pagination mode (sync or range)
        #[arg(long)]
        mode: Option<TransactionFetchMode>,
        /// Transactions requested per page
        #[arg(long)]
        page_size: Option<usize>,
        /// Country codes for link tokens
        #[arg(long, value_delimiter = ',')]
        country_codes: Option<Vec<String>>,
        /// API base URL override (mock servers, proxies)
        #[arg(long)]
        base_url: Option<String>,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show { json } => show(json),
        ConfigCommands::Set {
            client_id,
            secret,
            environment,
            mode,
            page_size,
            country_codes,
            base_url,
        } => {
            let dir = get_plaidsync_dir()?;
            std::fs::create_dir_all(&dir)?;

            // File values only, so environment overrides never get written back
            let mut config = PlaidConfig::load_file(&dir)
                .with_context(|| format!("Failed to load settings from {:?}", dir))?;

            if let Some(client_id) = client_id {
                config.client_id = client_id;
            }
            if let Some(secret) = secret {
                config.secret = secret;
            }
            if let Some(environment) = environment {
                config.environment = environment;
            }
            if let Some(mode) = mode {
                config.options.transaction_mode = mode;
            }
            if let Some(page_size) = page_size {
                config.options.page_size = page_size;
            }
            if let Some(codes) = country_codes {
                config.country_codes = codes;
            }
            if let Some(base_url) = base_url {
                config.base_url = Some(base_url).filter(|url| !url.is_empty());
            }

            config.validate_settings()?;
            config.save(&dir)?;
            output::success(&format!("Settings saved to {:?}", dir));
            if config.client_id.is_empty() || config.secret.is_empty() {
                output::warning("Client id and secret are still missing. Set them with --client-id and --secret");
            }
            Ok(())
        }
    }
}

fn show(json: bool) -> Result<()> {
    let config = load_config()?;

    if json {
        let result = serde_json::json!({
            "clientId": config.client_id,
            "secret": mask_secret(&config.secret),
            "environment": config.environment,
            "baseUrl": config.api_base_url(),
            "clientName": config.client_name,
            "clientUserId": config.client_user_id,
            "language": config.language,
            "countryCodes": config.country_codes,
            "transactionMode": config.options.transaction_mode,
            "pageSize": config.options.effective_page_size(),
            "maxPages": config.options.max_pages,
            "timeoutSecs": config.options.timeout_secs,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", "Plaid Settings".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Client ID".to_string(), config.client_id.clone()]);
    table.add_row(vec!["Secret".to_string(), mask_secret(&config.secret)]);
    table.add_row(vec!["Environment".to_string(), config.environment.to_string()]);
    table.add_row(vec!["API URL".to_string(), config.api_base_url()]);
    table.add_row(vec!["Client name".to_string(), config.client_name.clone()]);
    table.add_row(vec!["Country codes".to_string(), config.country_codes.join(", ")]);
    table.add_row(vec![
        "Transaction mode".to_string(),
        config.options.transaction_mode.to_string(),
    ]);
    table.add_row(vec![
        "Page size".to_string(),
        config.options.effective_page_size().to_string(),
    ]);
    table.add_row(vec!["Max pages".to_string(), config.options.max_pages.to_string()]);
    table.add_row(vec![
        "Timeout".to_string(),
        format!("{}s", config.options.timeout_secs),
    ]);
    println!("{}", table);

    Ok(())
}
