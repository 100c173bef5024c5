//! Owner-minted fungible token
//!
//! Composes a [`Ledger`] with an [`AccessController`] behind a single lock.
//! Each public operation takes the lock once, validates, commits, and
//! records its event before releasing it, so every observer sees operations
//! whole and in one order.

use crate::crypto::{Address, KeyPair};
use crate::token::access::AccessController;
use crate::token::amount::Amount;
use crate::token::error::TokenError;
use crate::token::events::{
    ApprovalEvent, EventBroadcaster, OwnershipTransferredEvent, TokenEvent, TransferEvent,
};
use crate::token::ledger::{Ledger, TokenMetadata};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

/// Number of recent events retained in memory
pub const HISTORY_LIMIT: usize = 100;

/// Mutable state guarded by the token's lock
#[derive(Debug)]
struct TokenState {
    ledger: Ledger,
    access: AccessController,
    history: VecDeque<TokenEvent>,
}

/// A single-asset token with controller-gated minting
#[derive(Debug)]
pub struct Token {
    address: Address,
    metadata: TokenMetadata,
    state: Mutex<TokenState>,
    events: EventBroadcaster,
}

/// Serializable copy of a token's full state
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenSnapshot {
    pub address: Address,
    pub metadata: TokenMetadata,
    pub controller: Address,
    pub ledger: Ledger,
    pub history: Vec<TokenEvent>,
}

impl Token {
    /// Create a token with zero supply, controlled by `controller`
    pub fn new(
        address: Address,
        metadata: TokenMetadata,
        controller: Address,
    ) -> Result<Self, TokenError> {
        let access = AccessController::new(controller)?;
        Ok(Self::from_parts(
            address,
            metadata,
            Ledger::new(address),
            access,
            VecDeque::new(),
        ))
    }

    /// Rebuild a token from a snapshot, rejecting inconsistent state
    pub fn restore(snapshot: TokenSnapshot) -> Result<Self, TokenError> {
        if snapshot.ledger.token() != snapshot.address {
            return Err(TokenError::InconsistentState(format!(
                "ledger belongs to {} but snapshot is for {}",
                snapshot.ledger.token(),
                snapshot.address
            )));
        }
        snapshot.ledger.verify_supply()?;
        let access = AccessController::new(snapshot.controller)?;

        let mut history: VecDeque<TokenEvent> = snapshot.history.into();
        while history.len() > HISTORY_LIMIT {
            history.pop_front();
        }

        Ok(Self::from_parts(
            snapshot.address,
            snapshot.metadata,
            snapshot.ledger,
            access,
            history,
        ))
    }

    fn from_parts(
        address: Address,
        metadata: TokenMetadata,
        ledger: Ledger,
        access: AccessController,
        history: VecDeque<TokenEvent>,
    ) -> Self {
        Self {
            address,
            metadata,
            state: Mutex::new(TokenState {
                ledger,
                access,
                history,
            }),
            events: EventBroadcaster::new(),
        }
    }

    /// Capture the current state
    pub fn snapshot(&self) -> TokenSnapshot {
        let state = self.lock();
        TokenSnapshot {
            address: self.address,
            metadata: self.metadata.clone(),
            controller: state.access.current(),
            ledger: state.ledger.clone(),
            history: state.history.iter().cloned().collect(),
        }
    }

    /// Act as the account controlled by `key`
    pub fn connect(&self, key: &KeyPair) -> Signer<'_> {
        Signer {
            token: self,
            caller: key.address(),
        }
    }

    // Every mutation validates before writing, so a panic can never leave
    // the state half-applied and a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, TokenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, state: &mut TokenState, event: TokenEvent) {
        state.history.push_back(event.clone());
        if state.history.len() > HISTORY_LIMIT {
            state.history.pop_front();
        }
        self.events.broadcast(event);
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    /// Stable handle of this token instance
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current controller (the only account allowed to mint)
    pub fn owner(&self) -> Address {
        self.lock().access.current()
    }

    pub fn total_supply(&self) -> Amount {
        self.lock().ledger.total_supply()
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.lock().ledger.balance_of(account)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.lock().ledger.allowance(owner, spender)
    }

    pub fn holders(&self) -> Vec<(Address, Amount)> {
        self.lock().ledger.holders()
    }

    /// Retained event history, oldest first
    pub fn events(&self) -> Vec<TokenEvent> {
        self.lock().history.iter().cloned().collect()
    }

    /// Receive every event committed from now on
    pub fn subscribe(&self) -> broadcast::Receiver<TokenEvent> {
        self.events.subscribe()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Transfer `amount` from `caller` to `to`
    pub fn transfer(
        &self,
        caller: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<TransferEvent, TokenError> {
        let mut state = self.lock();
        let event = state.ledger.transfer(caller, to, amount)?;
        log::debug!("{}: transfer {} {} -> {}", self.symbol(), amount, caller, to);
        self.record(&mut state, event.clone().into());
        Ok(event)
    }

    /// Let `spender` move up to `amount` of `caller`'s tokens
    pub fn approve(
        &self,
        caller: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<ApprovalEvent, TokenError> {
        let mut state = self.lock();
        let event = state.ledger.approve(caller, spender, amount)?;
        log::debug!("{}: approve {} for {} by {}", self.symbol(), amount, spender, caller);
        self.record(&mut state, event.clone().into());
        Ok(event)
    }

    /// Move `amount` from `owner` to `to` using `caller`'s allowance
    pub fn transfer_from(
        &self,
        caller: &Address,
        owner: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<TransferEvent, TokenError> {
        let mut state = self.lock();
        let event = state.ledger.transfer_from(caller, owner, to, amount)?;
        log::debug!(
            "{}: transferFrom {} {} -> {} by {}",
            self.symbol(),
            amount,
            owner,
            to,
            caller
        );
        self.record(&mut state, event.clone().into());
        Ok(event)
    }

    /// Issue `amount` new tokens to `to`; only the controller may call this
    pub fn mint(
        &self,
        caller: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<TransferEvent, TokenError> {
        let mut state = self.lock();
        if let Err(e) = state.access.ensure_controller(caller) {
            log::warn!("{}: rejected mint by {}", self.symbol(), caller);
            return Err(e);
        }
        let event = state.ledger.mint(to, amount)?;
        log::info!("{}: minted {} to {}", self.symbol(), amount, to);
        self.record(&mut state, event.clone().into());
        Ok(event)
    }

    /// Hand control to `new_owner`; effective for the very next call
    pub fn transfer_ownership(
        &self,
        caller: &Address,
        new_owner: &Address,
    ) -> Result<OwnershipTransferredEvent, TokenError> {
        let mut state = self.lock();
        let event = match state
            .access
            .transfer_ownership(self.address, caller, new_owner)
        {
            Ok(event) => event,
            Err(e) => {
                log::warn!("{}: rejected ownership transfer by {}", self.symbol(), caller);
                return Err(e);
            }
        };
        log::info!(
            "{}: ownership transferred {} -> {}",
            self.symbol(),
            event.previous,
            event.new
        );
        self.record(&mut state, event.clone().into());
        Ok(event)
    }
}

/// A token bound to the caller identity proven by a private key
#[derive(Debug, Clone, Copy)]
pub struct Signer<'a> {
    token: &'a Token,
    caller: Address,
}

impl<'a> Signer<'a> {
    /// The identity every call is made as
    pub fn address(&self) -> Address {
        self.caller
    }

    pub fn token(&self) -> &'a Token {
        self.token
    }

    pub fn transfer(&self, to: &Address, amount: Amount) -> Result<TransferEvent, TokenError> {
        self.token.transfer(&self.caller, to, amount)
    }

    pub fn approve(
        &self,
        spender: &Address,
        amount: Amount,
    ) -> Result<ApprovalEvent, TokenError> {
        self.token.approve(&self.caller, spender, amount)
    }

    pub fn transfer_from(
        &self,
        owner: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<TransferEvent, TokenError> {
        self.token.transfer_from(&self.caller, owner, to, amount)
    }

    pub fn mint(&self, to: &Address, amount: Amount) -> Result<TransferEvent, TokenError> {
        self.token.mint(&self.caller, to, amount)
    }

    pub fn transfer_ownership(
        &self,
        new_owner: &Address,
    ) -> Result<OwnershipTransferredEvent, TokenError> {
        self.token.transfer_ownership(&self.caller, new_owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    struct Fixture {
        token: Token,
        owner: KeyPair,
        addr1: KeyPair,
        addr2: KeyPair,
    }

    fn deploy() -> Fixture {
        let owner = KeyPair::generate();
        let token = Token::new(
            Address::from_bytes([0xAA; 20]),
            TokenMetadata::default(),
            owner.address(),
        )
        .unwrap();

        Fixture {
            token,
            owner,
            addr1: KeyPair::generate(),
            addr2: KeyPair::generate(),
        }
    }

    fn usdc(text: &str) -> Amount {
        Amount::parse_units(text).unwrap()
    }

    // =========================================================================
    // Deployment
    // =========================================================================

    #[test]
    fn test_metadata() {
        let f = deploy();
        assert_eq!(f.token.name(), "Mock USD Coin");
        assert_eq!(f.token.symbol(), "USDC");
        assert_eq!(f.token.decimals(), 6);
    }

    #[test]
    fn test_initial_state() {
        let f = deploy();
        assert_eq!(f.token.owner(), f.owner.address());
        assert_eq!(f.token.total_supply(), Amount::ZERO);
        assert!(f.token.events().is_empty());
    }

    #[test]
    fn test_null_controller_rejected() {
        let result = Token::new(
            Address::from_bytes([0xAA; 20]),
            TokenMetadata::default(),
            Address::ZERO,
        );
        assert!(matches!(result, Err(TokenError::InvalidController(_))));
    }

    // =========================================================================
    // Minting
    // =========================================================================

    #[test]
    fn test_mint_to_address() {
        let f = deploy();
        let amount = usdc("1000");

        f.token
            .connect(&f.owner)
            .mint(&f.addr1.address(), amount)
            .unwrap();

        assert_eq!(f.token.balance_of(&f.addr1.address()), amount);
        assert_eq!(f.token.total_supply(), amount);
    }

    #[test]
    fn test_only_owner_can_mint() {
        let f = deploy();

        let result = f
            .token
            .connect(&f.addr1)
            .mint(&f.addr2.address(), usdc("1000"));

        assert_eq!(result, Err(TokenError::Unauthorized(f.addr1.address())));
        assert_eq!(f.token.total_supply(), Amount::ZERO);
        assert_eq!(f.token.balance_of(&f.addr2.address()), Amount::ZERO);
        assert!(f.token.events().is_empty());
    }

    #[test]
    fn test_mint_emits_transfer_from_null() {
        let f = deploy();
        let mut rx = f.token.subscribe();

        f.token
            .connect(&f.owner)
            .mint(&f.addr1.address(), usdc("1000"))
            .unwrap();

        match rx.try_recv().unwrap() {
            TokenEvent::Transfer(e) => {
                assert_eq!(e.from, Address::ZERO);
                assert_eq!(e.to, f.addr1.address());
                assert_eq!(e.amount, usdc("1000"));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_mint_multiple_addresses() {
        let f = deploy();
        let owner = f.token.connect(&f.owner);

        owner.mint(&f.addr1.address(), usdc("500")).unwrap();
        owner.mint(&f.addr2.address(), usdc("300")).unwrap();

        assert_eq!(f.token.balance_of(&f.addr1.address()), usdc("500"));
        assert_eq!(f.token.balance_of(&f.addr2.address()), usdc("300"));
        assert_eq!(f.token.total_supply(), usdc("800"));
    }

    // =========================================================================
    // Transfers and allowances
    // =========================================================================

    fn funded() -> Fixture {
        let f = deploy();
        f.token
            .connect(&f.owner)
            .mint(&f.addr1.address(), usdc("1000"))
            .unwrap();
        f
    }

    #[test]
    fn test_transfer_between_accounts() {
        let f = funded();

        f.token
            .connect(&f.addr1)
            .transfer(&f.addr2.address(), usdc("100"))
            .unwrap();

        assert_eq!(f.token.balance_of(&f.addr1.address()), usdc("900"));
        assert_eq!(f.token.balance_of(&f.addr2.address()), usdc("100"));
    }

    #[test]
    fn test_approve_and_transfer_from() {
        let f = funded();

        f.token
            .connect(&f.addr1)
            .approve(&f.addr2.address(), usdc("200"))
            .unwrap();
        assert_eq!(
            f.token.allowance(&f.addr1.address(), &f.addr2.address()),
            usdc("200")
        );

        f.token
            .connect(&f.addr2)
            .transfer_from(&f.addr1.address(), &f.owner.address(), usdc("100"))
            .unwrap();

        assert_eq!(f.token.balance_of(&f.addr1.address()), usdc("900"));
        assert_eq!(f.token.balance_of(&f.owner.address()), usdc("100"));
        assert_eq!(
            f.token.allowance(&f.addr1.address(), &f.addr2.address()),
            usdc("100")
        );
    }

    #[test]
    fn test_transfer_from_emits_only_transfer() {
        let f = funded();
        f.token
            .connect(&f.addr1)
            .approve(&f.addr2.address(), usdc("200"))
            .unwrap();

        let mut rx = f.token.subscribe();
        f.token
            .connect(&f.addr2)
            .transfer_from(&f.addr1.address(), &f.owner.address(), usdc("100"))
            .unwrap();

        assert_eq!(rx.try_recv().unwrap().name(), "Transfer");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let f = funded();

        let result = f
            .token
            .connect(&f.addr1)
            .transfer(&f.addr2.address(), usdc("2000"));

        assert!(matches!(result, Err(TokenError::InsufficientBalance { .. })));
        assert_eq!(f.token.balance_of(&f.addr1.address()), usdc("1000"));
        assert_eq!(f.token.balance_of(&f.addr2.address()), Amount::ZERO);
    }

    #[test]
    fn test_zero_transfer_still_notifies() {
        let f = funded();
        let mut rx = f.token.subscribe();

        f.token
            .connect(&f.addr1)
            .transfer(&f.addr2.address(), Amount::ZERO)
            .unwrap();

        match rx.try_recv().unwrap() {
            TokenEvent::Transfer(e) => assert_eq!(e.amount, Amount::ZERO),
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(f.token.balance_of(&f.addr1.address()), usdc("1000"));
    }

    #[test]
    fn test_failed_operation_emits_nothing() {
        let f = funded();
        let mut rx = f.token.subscribe();
        let before = f.token.events().len();

        let _ = f
            .token
            .connect(&f.addr2)
            .transfer_from(&f.addr1.address(), &f.addr2.address(), usdc("1"));

        assert!(rx.try_recv().is_err());
        assert_eq!(f.token.events().len(), before);
    }

    // =========================================================================
    // Ownership
    // =========================================================================

    #[test]
    fn test_transfer_ownership() {
        let f = deploy();

        let event = f
            .token
            .connect(&f.owner)
            .transfer_ownership(&f.addr1.address())
            .unwrap();

        assert_eq!(event.previous, f.owner.address());
        assert_eq!(event.new, f.addr1.address());
        assert_eq!(f.token.owner(), f.addr1.address());
    }

    #[test]
    fn test_new_owner_can_mint_old_cannot() {
        let f = deploy();
        f.token
            .connect(&f.owner)
            .transfer_ownership(&f.addr1.address())
            .unwrap();

        f.token
            .connect(&f.addr1)
            .mint(&f.addr2.address(), usdc("500"))
            .unwrap();
        assert_eq!(f.token.balance_of(&f.addr2.address()), usdc("500"));

        let result = f
            .token
            .connect(&f.owner)
            .mint(&f.addr2.address(), usdc("500"));
        assert_eq!(result, Err(TokenError::Unauthorized(f.owner.address())));
        assert_eq!(f.token.total_supply(), usdc("500"));
    }

    #[test]
    fn test_non_owner_cannot_transfer_ownership() {
        let f = deploy();

        let result = f
            .token
            .connect(&f.addr1)
            .transfer_ownership(&f.addr1.address());

        assert_eq!(result, Err(TokenError::Unauthorized(f.addr1.address())));
        assert_eq!(f.token.owner(), f.owner.address());
    }

    // =========================================================================
    // History, snapshots, concurrency
    // =========================================================================

    #[test]
    fn test_history_order_and_limit() {
        let f = funded();
        let sender = f.token.connect(&f.addr1);

        for _ in 0..HISTORY_LIMIT + 10 {
            sender.transfer(&f.addr2.address(), Amount::from_raw(1)).unwrap();
        }

        let events = f.token.events();
        assert_eq!(events.len(), HISTORY_LIMIT);
        // The initial mint has been evicted
        assert!(events.iter().all(|e| match e {
            TokenEvent::Transfer(t) => t.from == f.addr1.address(),
            _ => false,
        }));
    }

    #[test]
    fn test_snapshot_restore() {
        let f = funded();
        f.token
            .connect(&f.addr1)
            .approve(&f.addr2.address(), usdc("10"))
            .unwrap();

        let snapshot = f.token.snapshot();
        let restored = Token::restore(snapshot.clone()).unwrap();

        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.owner(), f.owner.address());
        assert_eq!(restored.balance_of(&f.addr1.address()), usdc("1000"));
        assert_eq!(
            restored.allowance(&f.addr1.address(), &f.addr2.address()),
            usdc("10")
        );
    }

    #[test]
    fn test_restore_rejects_foreign_ledger() {
        let f = funded();
        let mut snapshot = f.token.snapshot();
        snapshot.address = Address::from_bytes([0xBB; 20]);

        assert!(matches!(
            Token::restore(snapshot),
            Err(TokenError::InconsistentState(_))
        ));
    }

    #[test]
    fn test_concurrent_operations_conserve_supply() {
        let f = deploy();
        let token = Arc::new(f.token);
        let owner = f.owner.address();
        let accounts: Vec<Address> = (0..4).map(|_| KeyPair::generate().address()).collect();

        for account in &accounts {
            token.mint(&owner, account, usdc("1000")).unwrap();
        }

        let handles: Vec<_> = (0..accounts.len())
            .map(|i| {
                let token = Arc::clone(&token);
                let from = accounts[i];
                let to = accounts[(i + 1) % accounts.len()];
                thread::spawn(move || {
                    for n in 0..200u128 {
                        let _ = token.transfer(&from, &to, Amount::from_raw(n * 37));
                        if n % 50 == 0 {
                            token.mint(&owner, &to, Amount::from_raw(n)).unwrap();
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = token.snapshot();
        assert!(snapshot.ledger.verify_supply().is_ok());
        let minted_in_threads: u128 = (0..200u128).filter(|n| n % 50 == 0).sum::<u128>() * 4;
        assert_eq!(
            token.total_supply().raw(),
            usdc("4000").raw() + minted_in_threads
        );
    }
}
