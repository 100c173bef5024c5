//! Balance and allowance bookkeeping for a single asset
//!
//! The ledger validates every precondition and computes every new value
//! before it writes anything, so a failed operation leaves no trace.

use crate::crypto::Address;
use crate::token::amount::Amount;
use crate::token::error::TokenError;
use crate::token::events::{ApprovalEvent, TransferEvent};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Token metadata (immutable after creation)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenMetadata {
    /// Token name (e.g., "Mock USD Coin")
    pub name: String,
    /// Token symbol (e.g., "USDC")
    pub symbol: String,
    /// Decimal places
    pub decimals: u8,
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self {
            name: "Mock USD Coin".to_string(),
            symbol: "USDC".to_string(),
            decimals: Amount::DECIMALS,
        }
    }
}

/// Balances, allowances and total supply of one token
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ledger {
    /// Handle of the token this ledger belongs to
    token: Address,
    /// Balances: address -> amount (zero balances are not stored)
    balances: HashMap<Address, Amount>,
    /// Allowances: owner -> (spender -> amount)
    allowances: HashMap<Address, HashMap<Address, Amount>>,
    total_supply: Amount,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new(token: Address) -> Self {
        Self {
            token,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            total_supply: Amount::ZERO,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn token(&self) -> Address {
        self.token
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Get balance of an address (zero if unknown)
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or_default()
    }

    /// Get remaining allowance of `spender` over `owner`'s balance
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or_default()
    }

    /// All holders with a non-zero balance, largest first
    pub fn holders(&self) -> Vec<(Address, Amount)> {
        let mut holders: Vec<_> = self
            .balances
            .iter()
            .filter(|(_, b)| !b.is_zero())
            .map(|(a, b)| (*a, *b))
            .collect();
        holders.sort_by(|x, y| y.1.cmp(&x.1).then(x.0.cmp(&y.0)));
        holders
    }

    pub fn holder_count(&self) -> usize {
        self.balances.values().filter(|b| !b.is_zero()).count()
    }

    /// Sum of every balance, or `None` if it does not fit in an `Amount`
    pub fn balance_sum(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(Amount::ZERO, |acc, b| acc.checked_add(*b).ok())
    }

    /// Check that balances add up to the total supply
    pub fn verify_supply(&self) -> Result<(), TokenError> {
        match self.balance_sum() {
            Some(sum) if sum == self.total_supply => Ok(()),
            Some(sum) => Err(TokenError::InconsistentState(format!(
                "balances sum to {} but total supply is {}",
                sum, self.total_supply
            ))),
            None => Err(TokenError::InconsistentState(
                "balances overflow".to_string(),
            )),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Move `amount` from `sender` to `recipient`
    ///
    /// # Arguments
    /// * `sender` - Account being debited
    /// * `recipient` - Account being credited (must not be the null account)
    /// * `amount` - Amount to move; zero is allowed and still emits an event
    pub fn transfer(
        &mut self,
        sender: &Address,
        recipient: &Address,
        amount: Amount,
    ) -> Result<TransferEvent, TokenError> {
        self.validate_parties(sender, recipient)?;
        self.move_balance(sender, recipient, amount)?;
        Ok(self.transfer_event(*sender, *recipient, amount))
    }

    /// Set the allowance of `spender` over `owner`'s balance, replacing any
    /// previous value
    pub fn approve(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<ApprovalEvent, TokenError> {
        if owner.is_zero() {
            return Err(TokenError::InvalidSender(*owner));
        }
        if spender.is_zero() {
            return Err(TokenError::InvalidSpender(*spender));
        }

        self.set_allowance(owner, spender, amount);

        Ok(ApprovalEvent {
            token: self.token,
            owner: *owner,
            spender: *spender,
            amount,
            timestamp: Utc::now(),
        })
    }

    /// Move tokens out of `owner`'s balance on behalf of `spender`
    ///
    /// # Arguments
    /// * `spender` - Account holding the allowance
    /// * `owner` - Account being debited
    /// * `recipient` - Account being credited
    /// * `amount` - Amount to move; decremented from the allowance
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        owner: &Address,
        recipient: &Address,
        amount: Amount,
    ) -> Result<TransferEvent, TokenError> {
        self.validate_parties(owner, recipient)?;

        let current_allowance = self.allowance(owner, spender);
        if current_allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                required: amount,
                available: current_allowance,
            });
        }
        let remaining = current_allowance.checked_sub(amount)?;

        // Balance moves first: it is the only step left that can fail
        self.move_balance(owner, recipient, amount)?;
        self.set_allowance(owner, spender, remaining);

        Ok(self.transfer_event(*owner, *recipient, amount))
    }

    /// Create `amount` new tokens in `recipient`'s balance
    ///
    /// Authorization is not checked here; the owning token gates this call.
    pub(crate) fn mint(
        &mut self,
        recipient: &Address,
        amount: Amount,
    ) -> Result<TransferEvent, TokenError> {
        if recipient.is_zero() {
            return Err(TokenError::InvalidRecipient(*recipient));
        }

        let new_supply = self.total_supply.checked_add(amount)?;
        let new_balance = self.balance_of(recipient).checked_add(amount)?;

        self.total_supply = new_supply;
        self.store_balance(recipient, new_balance);

        Ok(self.transfer_event(Address::ZERO, *recipient, amount))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn validate_parties(&self, from: &Address, to: &Address) -> Result<(), TokenError> {
        if from.is_zero() {
            return Err(TokenError::InvalidSender(*from));
        }
        if to.is_zero() {
            return Err(TokenError::InvalidRecipient(*to));
        }
        Ok(())
    }

    fn move_balance(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                required: amount,
                available: from_balance,
            });
        }

        if from == to {
            return Ok(());
        }

        let new_from = from_balance.checked_sub(amount)?;
        let new_to = self.balance_of(to).checked_add(amount)?;

        self.store_balance(from, new_from);
        self.store_balance(to, new_to);
        Ok(())
    }

    fn store_balance(&mut self, account: &Address, amount: Amount) {
        if amount.is_zero() {
            self.balances.remove(account);
        } else {
            self.balances.insert(*account, amount);
        }
    }

    fn set_allowance(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        if amount.is_zero() {
            if let Some(spenders) = self.allowances.get_mut(owner) {
                spenders.remove(spender);
                if spenders.is_empty() {
                    self.allowances.remove(owner);
                }
            }
            return;
        }

        self.allowances
            .entry(*owner)
            .or_default()
            .insert(*spender, amount);
    }

    fn transfer_event(&self, from: Address, to: Address, amount: Amount) -> TransferEvent {
        TransferEvent {
            token: self.token,
            from,
            to,
            amount,
            timestamp: Utc::now(),
        }
    }
}
