//! Wallet module: signer identities kept on disk

pub mod wallet;

pub use wallet::{Wallet, WalletError, WalletInfo, WalletManager};
