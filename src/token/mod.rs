//! ERC-20 style fungible token with an owner-gated mint
//!
//! Provides:
//! - Balances per address
//! - Allowances for delegated transfers
//! - Minting restricted to a single controller account
//! - Transfer, approval and ownership events
//!
//! # Example
//!
//! ```
//! use mock_usdc::crypto::KeyPair;
//! use mock_usdc::token::{Amount, TokenManager};
//!
//! let mut manager = TokenManager::new();
//! let owner = KeyPair::generate();
//! let alice = KeyPair::generate();
//!
//! // Deploy a token controlled by `owner`
//! let token = manager.deploy(&owner.address()).unwrap();
//!
//! // Mint 1000 USDC to alice
//! let amount = Amount::parse_units("1000").unwrap();
//! token.connect(&owner).mint(&alice.address(), amount).unwrap();
//!
//! assert_eq!(token.balance_of(&alice.address()), amount);
//! assert_eq!(token.total_supply(), amount);
//! ```

pub mod access;
pub mod amount;
pub mod error;
pub mod events;
pub mod ledger;
pub mod manager;
pub mod token;

pub use access::AccessController;
pub use amount::{Amount, AmountError};
pub use error::TokenError;
pub use events::{
    ApprovalEvent, EventBroadcaster, OwnershipTransferredEvent, TokenEvent, TransferEvent,
};
pub use ledger::{Ledger, TokenMetadata};
pub use manager::{ManagerSnapshot, TokenManager};
pub use token::{Signer, Token, TokenSnapshot, HISTORY_LIMIT};
