//! capbank CLI - a capped custodial ledger on the command line
//!
//! Each command loads the bank from its JSON state file, performs one
//! invocation and writes the state back only if the invocation succeeded.
//!
//! # Quick Start
//!
//! ```bash
//! capbank init --cap 1000
//! capbank deposit alice 75
//! capbank withdraw alice 50
//! capbank status
//! capbank demo reentrancy
//! ```

use std::path::PathBuf;

use anyhow::Context;
use capbank_types::{AccountId, Amount};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod display;
mod store;

use crate::commands::{bank, demo};
use crate::config::{CliConfig, LoggingConfig};
use crate::store::Store;

/// capbank - capped custodial value ledger
#[derive(Parser)]
#[command(name = "capbank")]
#[command(author = "capbank Contributors")]
#[command(version)]
#[command(about = "Deposit, withdraw and audit a capped custodial ledger", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(long, global = true, env = "CAPBANK_CONFIG")]
    config: Option<PathBuf>,

    /// Bank state file (overrides storage.state_file)
    #[arg(long, global = true, env = "CAPBANK_STATE")]
    state: Option<PathBuf>,

    /// Log level (overrides logging.level)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format: json, pretty or compact
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new bank
    Init {
        /// Bank cap in whole units (defaults to bank.cap)
        #[arg(long)]
        cap: Option<Amount>,

        /// Value the bank holds from construction (defaults to bank.endowment)
        #[arg(long)]
        endowment: Option<Amount>,

        /// Replace an existing bank
        #[arg(long)]
        force: bool,
    },

    /// Deposit value for an account
    Deposit {
        /// Depositing account
        from: AccountId,

        /// Amount in whole units, e.g. 12.5
        amount: Amount,
    },

    /// Withdraw value from an account into its wallet
    Withdraw {
        /// Withdrawing account
        to: AccountId,

        /// Amount in whole units (at most 50)
        amount: Amount,
    },

    /// Show an account's balance
    Balance { account: AccountId },

    /// Show bank totals and reconcile the books
    Status,

    /// List recorded deposit and withdrawal events
    Events {
        /// Show only the most recent events
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Print one JSON object per line
        #[arg(long)]
        json: bool,
    },

    /// Run in-memory demonstrations
    Demo {
        #[command(subcommand)]
        demo_type: DemoCommands,
    },
}

#[derive(Subcommand)]
enum DemoCommands {
    /// A recipient that reenters withdraw while being paid
    Reentrancy {
        /// Number of nested withdraw attempts
        #[arg(short, long, default_value = "5")]
        attempts: u32,
    },

    /// Many tasks depositing into one shared bank
    Contention {
        /// Number of concurrent depositors
        #[arg(short, long, default_value = "16")]
        tasks: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    init_logging(&config.logging)?;

    let state_path = cli
        .state
        .unwrap_or_else(|| config.storage.state_path());
    debug!(state = %state_path.display(), "using state file");
    let store = Store::new(state_path);

    match cli.command {
        Commands::Init {
            cap,
            endowment,
            force,
        } => {
            let cap = match cap {
                Some(cap) => cap,
                None => config.bank.cap_amount().context("invalid bank.cap")?,
            };
            let endowment = match endowment {
                Some(endowment) => endowment,
                None => config
                    .bank
                    .endowment_amount()
                    .context("invalid bank.endowment")?,
            };
            bank::init(&store, cap, endowment, force)
        }
        Commands::Deposit { from, amount } => bank::deposit(&store, &from, amount),
        Commands::Withdraw { to, amount } => bank::withdraw(&store, &to, amount),
        Commands::Balance { account } => bank::balance(&store, &account),
        Commands::Status => bank::status(&store),
        Commands::Events { limit, json } => bank::events(&store, limit, json),
        Commands::Demo { demo_type } => match demo_type {
            DemoCommands::Reentrancy { attempts } => demo::reentrancy(attempts),
            DemoCommands::Contention { tasks } => demo::contention(tasks).await,
        },
    }
}

/// Initialize logging; output goes to stderr so it never mixes with results
fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
        "pretty" => subscriber
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init()?,
        _ => subscriber
            .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
            .try_init()?,
    }

    Ok(())
}
