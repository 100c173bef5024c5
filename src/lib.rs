//! Mock USDC: an owner-minted fungible token ledger in Rust
//!
//! This crate provides a single-asset token featuring:
//! - Balances, allowances and total supply with checked 6-decimal arithmetic
//! - Minting restricted to a single controller, with immediate ownership handover
//! - Transfer, Approval and OwnershipTransferred events, broadcast in commit order
//! - secp256k1 signer identities and an on-disk keystore
//! - JSON persistence with backups
//!
//! # Example
//!
//! ```rust
//! use mock_usdc::crypto::KeyPair;
//! use mock_usdc::token::{Amount, TokenError, TokenManager};
//!
//! let mut manager = TokenManager::new();
//! let owner = KeyPair::generate();
//! let user = KeyPair::generate();
//!
//! let token = manager.deploy(&owner.address()).unwrap();
//! println!("Deployed to: {}", token.address());
//!
//! // Only the owner may mint
//! let amount = Amount::parse_units("500").unwrap();
//! let denied = token.connect(&user).mint(&user.address(), amount);
//! assert_eq!(denied, Err(TokenError::Unauthorized(user.address())));
//!
//! token.connect(&owner).mint(&user.address(), amount).unwrap();
//! assert_eq!(token.balance_of(&user.address()), amount);
//! ```

pub mod cli;
pub mod crypto;
pub mod storage;
pub mod token;
pub mod wallet;

// Re-export commonly used types
pub use crypto::{Address, KeyPair};
pub use storage::{Storage, StorageConfig};
pub use token::{
    AccessController, Amount, Ledger, Signer, Token, TokenError, TokenEvent, TokenManager,
    TokenMetadata,
};
pub use wallet::{Wallet, WalletManager};
