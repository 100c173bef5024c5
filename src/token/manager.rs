//! Token manager for deploying and looking up token instances
//!
//! Handles deployment and hands out shared references to deployed tokens.

use crate::crypto::{sha256, Address};
use crate::token::error::TokenError;
use crate::token::ledger::TokenMetadata;
use crate::token::token::{Token, TokenSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Manages all deployed tokens
#[derive(Debug, Default)]
pub struct TokenManager {
    /// All tokens by address
    tokens: HashMap<Address, Arc<Token>>,
    /// Deployment order
    deployments: Vec<Address>,
    /// Deployment counter for address generation
    nonce: u64,
}

/// Serializable state of a [`TokenManager`]
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ManagerSnapshot {
    pub nonce: u64,
    /// Tokens in deployment order
    pub tokens: Vec<TokenSnapshot>,
}

impl TokenManager {
    /// Create a new token manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy a new token controlled by `deployer`
    ///
    /// The token starts with zero supply; only `deployer` may mint until
    /// ownership is transferred.
    pub fn deploy(&mut self, deployer: &Address) -> Result<Arc<Token>, TokenError> {
        self.deploy_with_metadata(deployer, TokenMetadata::default())
    }

    /// Deploy a token with custom metadata
    pub fn deploy_with_metadata(
        &mut self,
        deployer: &Address,
        metadata: TokenMetadata,
    ) -> Result<Arc<Token>, TokenError> {
        let address = self.generate_address(deployer);
        self.nonce += 1;

        if self.tokens.contains_key(&address) {
            return Err(TokenError::TokenAlreadyExists(address.to_string()));
        }

        let token = Arc::new(Token::new(address, metadata, *deployer)?);
        self.tokens.insert(address, Arc::clone(&token));
        self.deployments.push(address);

        log::info!("{} deployed to: {}", token.symbol(), address);

        Ok(token)
    }

    /// Generate token address from deployer and nonce
    fn generate_address(&self, deployer: &Address) -> Address {
        let input = format!("{}:{}", deployer, self.nonce);
        let hash = sha256(input.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[..20]);
        Address::from_bytes(bytes)
    }

    /// Get a token by address
    pub fn get(&self, address: &Address) -> Result<Arc<Token>, TokenError> {
        self.tokens
            .get(address)
            .cloned()
            .ok_or_else(|| TokenError::TokenNotFound(address.to_string()))
    }

    /// Most recently deployed token
    pub fn latest(&self) -> Option<Arc<Token>> {
        self.deployments
            .last()
            .and_then(|address| self.tokens.get(address))
            .cloned()
    }

    /// List all tokens in deployment order
    pub fn list(&self) -> Vec<Arc<Token>> {
        self.deployments
            .iter()
            .filter_map(|address| self.tokens.get(address))
            .cloned()
            .collect()
    }

    /// Get token count
    pub fn count(&self) -> usize {
        self.tokens.len()
    }

    /// Capture every token's state
    pub fn snapshot(&self) -> ManagerSnapshot {
        ManagerSnapshot {
            nonce: self.nonce,
            tokens: self.list().iter().map(|t| t.snapshot()).collect(),
        }
    }

    /// Rebuild a manager from a snapshot
    pub fn restore(snapshot: ManagerSnapshot) -> Result<Self, TokenError> {
        let mut manager = Self {
            nonce: snapshot.nonce,
            ..Self::default()
        };

        for token_snapshot in snapshot.tokens {
            let token = Token::restore(token_snapshot)?;
            let address = token.address();
            if manager.tokens.contains_key(&address) {
                return Err(TokenError::TokenAlreadyExists(address.to_string()));
            }
            manager.tokens.insert(address, Arc::new(token));
            manager.deployments.push(address);
        }

        Ok(manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Amount;

    fn deployer() -> Address {
        Address::from_bytes([1; 20])
    }

    #[test]
    fn test_manager_creation() {
        let manager = TokenManager::new();
        assert_eq!(manager.count(), 0);
        assert!(manager.latest().is_none());
    }

    #[test]
    fn test_deploy() {
        let mut manager = TokenManager::new();

        let token = manager.deploy(&deployer()).unwrap();

        assert!(!token.address().is_zero());
        assert_eq!(token.owner(), deployer());
        assert_eq!(token.total_supply(), Amount::ZERO);
        assert_eq!(token.symbol(), "USDC");
        assert_eq!(manager.count(), 1);
        assert_eq!(manager.get(&token.address()).unwrap().address(), token.address());
    }

    #[test]
    fn test_deploy_addresses_are_unique() {
        let mut manager = TokenManager::new();

        let first = manager.deploy(&deployer()).unwrap();
        let second = manager.deploy(&deployer()).unwrap();

        assert_ne!(first.address(), second.address());
        assert_eq!(manager.latest().unwrap().address(), second.address());
        let order: Vec<_> = manager.list().iter().map(|t| t.address()).collect();
        assert_eq!(order, vec![first.address(), second.address()]);
    }

    #[test]
    fn test_deploy_is_deterministic() {
        let mut a = TokenManager::new();
        let mut b = TokenManager::new();
        assert_eq!(
            a.deploy(&deployer()).unwrap().address(),
            b.deploy(&deployer()).unwrap().address()
        );
    }

    #[test]
    fn test_deploy_null_deployer() {
        let mut manager = TokenManager::new();
        let result = manager.deploy(&Address::ZERO);
        assert!(matches!(result, Err(TokenError::InvalidController(_))));
        assert_eq!(manager.count(), 0);
    }

    #[test]
    fn test_get_unknown_token() {
        let manager = TokenManager::new();
        let result = manager.get(&Address::from_bytes([9; 20]));
        assert!(matches!(result, Err(TokenError::TokenNotFound(_))));
    }

    #[test]
    fn test_snapshot_restore() {
        let mut manager = TokenManager::new();
        let token = manager.deploy(&deployer()).unwrap();
        token
            .mint(&deployer(), &Address::from_bytes([2; 20]), Amount::from_raw(5))
            .unwrap();

        let snapshot = manager.snapshot();
        let mut restored = TokenManager::restore(snapshot.clone()).unwrap();

        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(
            restored
                .get(&token.address())
                .unwrap()
                .balance_of(&Address::from_bytes([2; 20])),
            Amount::from_raw(5)
        );

        // The nonce survives, so the next deployment gets a fresh address
        let next = restored.deploy(&deployer()).unwrap();
        assert_ne!(next.address(), token.address());
    }
}
