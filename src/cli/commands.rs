//! CLI commands for the token ledger
//!
//! Implements all command handlers for the CLI interface. Every mutating
//! command is issued as a wallet from the local keystore, and state is saved
//! after each successful command.

use crate::crypto::Address;
use crate::storage::{Storage, StorageConfig};
use crate::token::{Amount, Token, TokenEvent, TokenManager};
use crate::wallet::WalletManager;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub manager: TokenManager,
    pub storage: Storage,
    pub wallet_manager: WalletManager,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize application state
    pub fn new(data_dir: PathBuf) -> CliResult<Self> {
        let storage_config = StorageConfig {
            data_dir: data_dir.clone(),
            ..Default::default()
        };

        let storage = Storage::new(storage_config)?;
        let wallet_dir = data_dir.join("wallets");
        let wallet_manager = WalletManager::new(&wallet_dir)?;
        let manager = storage.load_or_default()?;

        log::debug!(
            "Loaded {} token(s) from {}",
            manager.count(),
            data_dir.display()
        );

        Ok(Self {
            manager,
            storage,
            wallet_manager,
            data_dir,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.manager)?;
        Ok(())
    }

    /// Resolve the token a command targets: explicit handle or latest deploy
    pub fn token(&self, address: Option<&str>) -> CliResult<Arc<Token>> {
        match address {
            Some(a) => Ok(self.manager.get(&a.parse::<Address>()?)?),
            None => self
                .manager
                .latest()
                .ok_or_else(|| "No token deployed yet. Run: mock-usdc deploy --from <wallet>".into()),
        }
    }

    /// Resolve an account argument: a wallet label or a raw address
    pub fn account(&self, name: &str) -> CliResult<Address> {
        if let Ok(address) = name.parse::<Address>() {
            return Ok(address);
        }
        Ok(self.wallet_manager.load_wallet(name)?.address())
    }
}

/// Deploy a new token controlled by `from`
pub fn cmd_deploy(state: &mut AppState, from: &str) -> CliResult<()> {
    let deployer = state.wallet_manager.load_wallet(from)?;
    let token = state.manager.deploy(&deployer.address())?;
    state.save()?;

    println!("MockUSDC deployed to: {}", token.address());
    println!("   Name: {} ({})", token.name(), token.symbol());
    println!("   Decimals: {}", token.decimals());
    println!("   Owner: {}", token.owner());

    Ok(())
}

/// Create a new wallet
pub fn cmd_account_new(state: &AppState, label: Option<&str>) -> CliResult<()> {
    let wallet = state.wallet_manager.create_wallet(label)?;

    println!("🔐 New account created!");
    println!("   📍 Address: {}", wallet.address());
    if let Some(l) = &wallet.label {
        println!("   🏷️  Label: {}", l);
    }
    println!("\n   ⚠️  The private key is stored in {:?}", state.data_dir.join("wallets"));

    Ok(())
}

/// List all wallets with their balance on the current token
pub fn cmd_account_list(state: &AppState, token: Option<&str>) -> CliResult<()> {
    let wallets = state.wallet_manager.list_wallets()?;

    if wallets.is_empty() {
        println!("📭 No accounts found. Create one with: mock-usdc account new");
        return Ok(());
    }

    let token = state.token(token).ok();

    println!("📋 Accounts:");
    for wallet in &wallets {
        let label = wallet.label.as_deref().unwrap_or("-");
        match &token {
            Some(t) => println!(
                "   {} ({}) - {} {}",
                wallet.address,
                label,
                t.balance_of(&wallet.address),
                t.symbol()
            ),
            None => println!("   {} ({})", wallet.address, label),
        }
    }

    Ok(())
}

/// Display token info
pub fn cmd_info(state: &AppState, token: Option<&str>) -> CliResult<()> {
    let token = state.token(token)?;
    let holders = token.holders();

    println!("🪙  {} ({})", token.name(), token.symbol());
    println!("   ├─ Address: {}", token.address());
    println!("   ├─ Decimals: {}", token.decimals());
    println!("   ├─ Owner: {}", token.owner());
    println!("   ├─ Total supply: {}", token.total_supply());
    println!("   └─ Holders: {}", holders.len());

    for (address, balance) in holders.iter().take(10) {
        println!("      └─ {} = {}", address, balance);
    }
    if holders.len() > 10 {
        println!("      ... and {} more", holders.len() - 10);
    }

    Ok(())
}

/// Show the balance of an account
pub fn cmd_balance(state: &AppState, token: Option<&str>, account: &str) -> CliResult<()> {
    let token = state.token(token)?;
    let address = state.account(account)?;

    println!(
        "💰 {}: {} {}",
        address,
        token.balance_of(&address),
        token.symbol()
    );
    Ok(())
}

/// Show an allowance
pub fn cmd_allowance(
    state: &AppState,
    token: Option<&str>,
    owner: &str,
    spender: &str,
) -> CliResult<()> {
    let token = state.token(token)?;
    let owner = state.account(owner)?;
    let spender = state.account(spender)?;

    println!(
        "🔓 {} may spend {} {} of {}",
        spender,
        token.allowance(&owner, &spender),
        token.symbol(),
        owner
    );
    Ok(())
}

/// Show the current controller
pub fn cmd_owner(state: &AppState, token: Option<&str>) -> CliResult<()> {
    let token = state.token(token)?;
    println!("👑 Owner: {}", token.owner());
    Ok(())
}

/// Mint tokens (owner only)
pub fn cmd_mint(
    state: &AppState,
    token: Option<&str>,
    from: &str,
    to: &str,
    amount: Amount,
) -> CliResult<()> {
    let token = state.token(token)?;
    let signer = state.wallet_manager.load_wallet(from)?;
    let to = state.account(to)?;

    let event = token.connect(signer.key_pair()).mint(&to, amount)?;
    state.save()?;

    println!("✅ Minted {} {} to {}", event.amount, token.symbol(), event.to);
    println!("   New total supply: {}", token.total_supply());
    Ok(())
}

/// Transfer tokens
pub fn cmd_transfer(
    state: &AppState,
    token: Option<&str>,
    from: &str,
    to: &str,
    amount: Amount,
) -> CliResult<()> {
    let token = state.token(token)?;
    let signer = state.wallet_manager.load_wallet(from)?;
    let to = state.account(to)?;

    let event = token.connect(signer.key_pair()).transfer(&to, amount)?;
    state.save()?;

    println!("📤 Transferred {} {}", event.amount, token.symbol());
    println!("   From: {}", event.from);
    println!("   To: {}", event.to);
    Ok(())
}

/// Approve a spender
pub fn cmd_approve(
    state: &AppState,
    token: Option<&str>,
    from: &str,
    spender: &str,
    amount: Amount,
) -> CliResult<()> {
    let token = state.token(token)?;
    let signer = state.wallet_manager.load_wallet(from)?;
    let spender = state.account(spender)?;

    let event = token.connect(signer.key_pair()).approve(&spender, amount)?;
    state.save()?;

    println!(
        "✅ {} may now spend {} {} of {}",
        event.spender,
        event.amount,
        token.symbol(),
        event.owner
    );
    Ok(())
}

/// Delegated transfer
pub fn cmd_transfer_from(
    state: &AppState,
    token: Option<&str>,
    from: &str,
    owner: &str,
    to: &str,
    amount: Amount,
) -> CliResult<()> {
    let token = state.token(token)?;
    let signer = state.wallet_manager.load_wallet(from)?;
    let owner = state.account(owner)?;
    let to = state.account(to)?;

    let event = token
        .connect(signer.key_pair())
        .transfer_from(&owner, &to, amount)?;
    state.save()?;

    println!("📤 Transferred {} {} on behalf of {}", event.amount, token.symbol(), event.from);
    println!("   To: {}", event.to);
    println!(
        "   Remaining allowance: {}",
        token.allowance(&owner, &signer.address())
    );
    Ok(())
}

/// Hand over minting rights
pub fn cmd_transfer_ownership(
    state: &AppState,
    token: Option<&str>,
    from: &str,
    new_owner: &str,
) -> CliResult<()> {
    let token = state.token(token)?;
    let signer = state.wallet_manager.load_wallet(from)?;
    let new_owner = state.account(new_owner)?;

    let event = token
        .connect(signer.key_pair())
        .transfer_ownership(&new_owner)?;
    state.save()?;

    println!("👑 Ownership transferred");
    println!("   Previous: {}", event.previous);
    println!("   New: {}", event.new);
    Ok(())
}

/// List recent events
pub fn cmd_events(state: &AppState, token: Option<&str>, count: usize) -> CliResult<()> {
    let token = state.token(token)?;
    let events = token.events();

    if events.is_empty() {
        println!("📭 No events yet.");
        return Ok(());
    }

    println!("📜 Recent events:");
    for event in events.iter().rev().take(count) {
        println!("   {}", describe_event(event));
    }

    Ok(())
}

fn describe_event(event: &TokenEvent) -> String {
    let time = event.timestamp().format("%Y-%m-%d %H:%M:%S");
    match event {
        TokenEvent::Transfer(e) => format!(
            "{} | {} | {} -> {} : {}",
            time,
            event.name(),
            e.from,
            e.to,
            e.amount
        ),
        TokenEvent::Approval(e) => format!(
            "{} | {} | {} allows {} : {}",
            time,
            event.name(),
            e.owner,
            e.spender,
            e.amount
        ),
        TokenEvent::OwnershipTransferred(e) => format!(
            "{} | {} | {} -> {}",
            time,
            event.name(),
            e.previous,
            e.new
        ),
    }
}

/// Export all tokens to a file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    crate::storage::save_to_file(&state.manager, path)?;
    println!("📦 Ledger exported to {:?}", path);
    Ok(())
}

/// Import tokens from a file, replacing the current state
pub fn cmd_import(state: &mut AppState, path: &Path) -> CliResult<()> {
    state.manager = crate::storage::load_from_file(path)?;
    state.save()?;

    println!("📥 Ledger imported from {:?}", path);
    println!("   Tokens: {}", state.manager.count());
    Ok(())
}
