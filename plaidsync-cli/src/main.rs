//! Plaidsync CLI - link bank accounts and pull their data from Plaid

use std::process::ExitCode;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use plaidsync_core::TransactionFetchMode;

mod commands;
mod output;

use commands::{balances, config, exchange, item, link, reset, sync, transactions};

/// Plaidsync - link bank accounts and fetch balances and transactions
#[derive(Parser)]
#[command(name = "plaidsync", version, about, long_about = None)]
struct Cli {
    /// Show debug logs (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Access token of a linked item
#[derive(Args)]
pub struct TokenArgs {
    #[arg(long, env = "PLAIDSYNC_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a link token (update mode when an access token is given)
    LinkToken {
        /// Re-authenticate this existing item instead of linking a new one
        #[arg(long)]
        access_token: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Exchange a public token from the link flow for an access token
    Exchange {
        /// Public token (prompted for when omitted)
        public_token: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Force an item into the login-required state (sandbox only)
    ResetLogin {
        #[command(flatten)]
        token: TokenArgs,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Show metadata of a linked item
    Item {
        #[command(flatten)]
        token: TokenArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show account balances of a linked item
    Balances {
        #[command(flatten)]
        token: TokenArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch transactions in a date range
    Transactions {
        #[command(flatten)]
        token: TokenArgs,
        /// First day to include (default: 30 days ago)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day to include (default: today)
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Only include these accounts
        #[arg(long = "account-id")]
        account_ids: Vec<String>,
        /// Pagination mode (sync or range), overrides the configured one
        #[arg(long)]
        mode: Option<TransactionFetchMode>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Incremental sync: added, modified and removed transactions since a cursor
    Sync {
        #[command(flatten)]
        token: TokenArgs,
        /// Cursor returned by the previous sync (default: full history)
        #[arg(long)]
        cursor: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            commands::report_error(&e);
            ExitCode::FAILURE
        }
    }
}

/// Route library logs to stderr, `RUST_LOG` first, then `--verbose`
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(verbose).with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::LinkToken { access_token, json } => link::run(access_token.as_deref(), json),
        Commands::Exchange { public_token, json } => exchange::run(public_token, json),
        Commands::ResetLogin { token, force } => reset::run(&token.access_token, force),
        Commands::Item { token, json } => item::run(&token.access_token, json),
        Commands::Balances { token, json } => balances::run(&token.access_token, json),
        Commands::Transactions { token, start, end, account_ids, mode, json } => {
            transactions::run(&token.access_token, start, end, account_ids, mode, json)
        }
        Commands::Sync { token, cursor, json } => sync::run(&token.access_token, cursor.as_deref(), json),
        Commands::Config { command } => config::run(command),
    }
}
