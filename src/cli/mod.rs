use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

use crate::application::LedgerService;
use crate::domain::Account;

/// Account Ledger - account registry with atomic transfers
#[derive(Parser)]
#[command(name = "account-ledger")]
#[command(about = "A durable account registry with atomic balance transfers")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "ledger.db", env = "LEDGER_DATABASE")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Write the seed accounts (account1..account6), overwriting existing ones
    Seed,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Transfer funds between two accounts
    Transfer {
        /// Amount to transfer (e.g., "300" or "12.50")
        amount: String,

        /// Source account id
        #[arg(long)]
        from: String,

        /// Destination account id
        #[arg(long)]
        to: String,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Account id (must be unique)
        id: String,

        /// Owner name
        #[arg(short, long)]
        owner: String,

        /// Opening balance
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        balance: String,
    },

    /// Show an account
    Show {
        /// Account id
        id: String,
    },

    /// Replace the owner and balance of an account
    Update {
        /// Account id
        id: String,

        /// Owner name
        #[arg(short, long)]
        owner: String,

        /// New balance
        #[arg(short, long, allow_hyphen_values = true)]
        balance: String,
    },

    /// Delete an account
    Delete {
        /// Account id
        id: String,
    },

    /// Check whether an account exists
    Exists {
        /// Account id
        id: String,
    },

    /// List all accounts
    List {
        /// Print the accounts as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Install the stderr log subscriber.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(level);
    tracing_subscriber::registry().with(layer).init();
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Seed => {
                let service = LedgerService::connect(&self.database).await?;
                let count = service.initialize_ledger().await?;
                println!("Seeded {} accounts", count);
            }

            Commands::Account(account_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_account_command(&service, account_cmd).await?;
            }

            Commands::Transfer { amount, from, to } => {
                let service = LedgerService::connect(&self.database).await?;
                let amount = parse_amount(&amount)?;
                let receipt = service.transfer_funds(&from, &to, amount).await?;

                println!(
                    "Transferred {} {} -> {} (balances: {} / {})",
                    receipt.amount,
                    receipt.from.id,
                    receipt.to.id,
                    receipt.from.balance,
                    receipt.to.balance
                );
            }
        }

        Ok(())
    }
}

async fn run_account_command(service: &LedgerService, cmd: AccountCommands) -> Result<()> {
    match cmd {
        AccountCommands::Create { id, owner, balance } => {
            let balance = parse_amount(&balance)?;
            let account = service.create_account(&id, &owner, balance).await?;
            println!("Created account: {} ({})", account.id, account.owner);
        }

        AccountCommands::Show { id } => {
            let account = service.read_account(&id).await?;
            println!("Account: {}", account.id);
            println!("  Owner:   {}", account.owner);
            println!("  Balance: {}", account.balance);
        }

        AccountCommands::Update { id, owner, balance } => {
            let balance = parse_amount(&balance)?;
            let account = service.update_account(&id, &owner, balance).await?;
            println!(
                "Updated account: {} ({}, {})",
                account.id, account.owner, account.balance
            );
        }

        AccountCommands::Delete { id } => {
            service.delete_account(&id).await?;
            println!("Deleted account: {}", id);
        }

        AccountCommands::Exists { id } => {
            let exists = service.account_exists(&id).await?;
            println!("{}", if exists { "yes" } else { "no" });
        }

        AccountCommands::List { json } => {
            let accounts = service.list_accounts().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&accounts)?);
            } else {
                print_accounts(&accounts);
            }
        }
    }
    Ok(())
}

fn print_accounts(accounts: &[Account]) {
    if accounts.is_empty() {
        println!("No accounts found.");
        return;
    }

    println!("{:<20} {:<20} {:>14}", "ID", "OWNER", "BALANCE");
    println!("{}", "-".repeat(56));
    for account in accounts {
        println!(
            "{:<20} {:<20} {:>14}",
            account.id, account.owner, account.balance
        );
    }
}

/// Parse a decimal amount exactly, e.g. "300", "-12.5", "0.01".
fn parse_amount(input: &str) -> Result<Decimal> {
    Decimal::from_str_exact(input.trim())
        .or_else(|_| Decimal::from_str(input.trim()))
        .with_context(|| format!("Invalid amount '{}'. Use '300' or '12.50'", input))
}
