//! Mock USDC CLI Application
//!
//! A command-line interface for deploying and operating the token ledger.

use clap::{Parser, Subcommand};
use mock_usdc::cli::{self, AppState};
use mock_usdc::token::Amount;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mock-usdc")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "An owner-minted USDC-style token ledger", long_about = None)]
struct Cli {
    /// Data directory for ledger storage and wallets
    #[arg(short, long, env = "MOCK_USDC_DATA_DIR", default_value = ".usdc_data")]
    data_dir: PathBuf,

    /// Token address (defaults to the most recently deployed token)
    #[arg(short, long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a new token owned by a wallet
    Deploy {
        /// Deployer wallet (label or address)
        #[arg(short, long)]
        from: String,
    },

    /// Account (wallet) operations
    Account {
        #[command(subcommand)]
        action: AccountCommands,
    },

    /// Display token information
    Info,

    /// Show the balance of an account
    Balance {
        /// Account (wallet label or address)
        #[arg(short, long)]
        address: String,
    },

    /// Show how much a spender may move out of an owner's balance
    Allowance {
        #[arg(short, long)]
        owner: String,

        #[arg(short, long)]
        spender: String,
    },

    /// Show the current owner
    Owner,

    /// Mint new tokens (owner only)
    Mint {
        /// Signing wallet
        #[arg(short, long)]
        from: String,

        /// Recipient
        #[arg(long)]
        to: String,

        /// Amount in whole units, e.g. 1000 or 12.5
        #[arg(short, long)]
        amount: Amount,
    },

    /// Transfer tokens
    Transfer {
        /// Signing wallet
        #[arg(short, long)]
        from: String,

        /// Recipient
        #[arg(long)]
        to: String,

        /// Amount in whole units
        #[arg(short, long)]
        amount: Amount,
    },

    /// Allow a spender to move tokens on your behalf
    Approve {
        /// Signing wallet (the owner of the tokens)
        #[arg(short, long)]
        from: String,

        #[arg(short, long)]
        spender: String,

        /// Amount in whole units
        #[arg(short, long)]
        amount: Amount,
    },

    /// Move tokens out of another account using an allowance
    TransferFrom {
        /// Signing wallet (the spender)
        #[arg(short, long)]
        from: String,

        /// Account the tokens are taken from
        #[arg(short, long)]
        owner: String,

        /// Recipient
        #[arg(long)]
        to: String,

        /// Amount in whole units
        #[arg(short, long)]
        amount: Amount,
    },

    /// Hand minting rights to another account (owner only)
    TransferOwnership {
        /// Signing wallet (the current owner)
        #[arg(short, long)]
        from: String,

        #[arg(short, long)]
        new_owner: String,
    },

    /// List recent events
    Events {
        /// Number of events to show
        #[arg(short, long, default_value = "20")]
        count: usize,
    },

    /// Export ledger to file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import ledger from file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Subcommand)]
enum AccountCommands {
    /// Create a new account
    New {
        /// Optional label for the account
        #[arg(short, long)]
        label: Option<String>,
    },

    /// List all accounts
    List,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut state = AppState::new(cli.data_dir.clone())?;
    let token = cli.token.as_deref();

    match cli.command {
        Commands::Deploy { from } => {
            cli::cmd_deploy(&mut state, &from)?;
        }

        Commands::Account { action } => match action {
            AccountCommands::New { label } => {
                cli::cmd_account_new(&state, label.as_deref())?;
            }
            AccountCommands::List => {
                cli::cmd_account_list(&state, token)?;
            }
        },

        Commands::Info => {
            cli::cmd_info(&state, token)?;
        }

        Commands::Balance { address } => {
            cli::cmd_balance(&state, token, &address)?;
        }

        Commands::Allowance { owner, spender } => {
            cli::cmd_allowance(&state, token, &owner, &spender)?;
        }

        Commands::Owner => {
            cli::cmd_owner(&state, token)?;
        }

        Commands::Mint { from, to, amount } => {
            cli::cmd_mint(&state, token, &from, &to, amount)?;
        }

        Commands::Transfer { from, to, amount } => {
            cli::cmd_transfer(&state, token, &from, &to, amount)?;
        }

        Commands::Approve {
            from,
            spender,
            amount,
        } => {
            cli::cmd_approve(&state, token, &from, &spender, amount)?;
        }

        Commands::TransferFrom {
            from,
            owner,
            to,
            amount,
        } => {
            cli::cmd_transfer_from(&state, token, &from, &owner, &to, amount)?;
        }

        Commands::TransferOwnership { from, new_owner } => {
            cli::cmd_transfer_ownership(&state, token, &from, &new_owner)?;
        }

        Commands::Events { count } => {
            cli::cmd_events(&state, token, count)?;
        }

        Commands::Export { output } => {
            cli::cmd_export(&state, &output)?;
        }

        Commands::Import { input } => {
            cli::cmd_import(&mut state, &input)?;
        }
    }

    Ok(())
}
