//! Single-controller access control
//!
//! Exactly one account may perform privileged operations. Handing control
//! over is immediate: there is no pending or acceptance step.

use crate::crypto::Address;
use crate::token::error::TokenError;
use crate::token::events::OwnershipTransferredEvent;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessController {
    controller: Address,
}

impl AccessController {
    /// Create a controller owned by `initial`
    pub fn new(initial: Address) -> Result<Self, TokenError> {
        if initial.is_zero() {
            return Err(TokenError::InvalidController(initial));
        }
        Ok(Self {
            controller: initial,
        })
    }

    /// The account currently holding control
    pub fn current(&self) -> Address {
        self.controller
    }

    /// Fail with `Unauthorized(caller)` unless `caller` is the controller
    pub fn ensure_controller(&self, caller: &Address) -> Result<(), TokenError> {
        if *caller != self.controller {
            return Err(TokenError::Unauthorized(*caller));
        }
        Ok(())
    }

    /// Hand control to `new_controller`
    ///
    /// # Arguments
    /// * `token` - Handle of the token, recorded on the event
    /// * `caller` - Must be the current controller
    /// * `new_controller` - Must not be the null account
    pub fn transfer_ownership(
        &mut self,
        token: Address,
        caller: &Address,
        new_controller: &Address,
    ) -> Result<OwnershipTransferredEvent, TokenError> {
        self.ensure_controller(caller)?;
        if new_controller.is_zero() {
            return Err(TokenError::InvalidController(*new_controller));
        }

        let previous = std::mem::replace(&mut self.controller, *new_controller);

        Ok(OwnershipTransferredEvent {
            token,
            previous,
            new: *new_controller,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    #[test]
    fn test_initial_controller() {
        let access = AccessController::new(addr(1)).unwrap();
        assert_eq!(access.current(), addr(1));
        assert!(access.ensure_controller(&addr(1)).is_ok());
        assert_eq!(
            access.ensure_controller(&addr(2)),
            Err(TokenError::Unauthorized(addr(2)))
        );
    }

    #[test]
    fn test_null_initial_controller() {
        assert_eq!(
            AccessController::new(Address::ZERO),
            Err(TokenError::InvalidController(Address::ZERO))
        );
    }

    #[test]
    fn test_transfer_ownership() {
        let mut access = AccessController::new(addr(1)).unwrap();

        let event = access
            .transfer_ownership(addr(0xAA), &addr(1), &addr(2))
            .unwrap();

        assert_eq!(event.previous, addr(1));
        assert_eq!(event.new, addr(2));
        assert_eq!(access.current(), addr(2));
        assert_eq!(
            access.ensure_controller(&addr(1)),
            Err(TokenError::Unauthorized(addr(1)))
        );
    }

    #[test]
    fn test_transfer_ownership_unauthorized() {
        let mut access = AccessController::new(addr(1)).unwrap();

        let result = access.transfer_ownership(addr(0xAA), &addr(3), &addr(3));
        assert_eq!(result, Err(TokenError::Unauthorized(addr(3))));
        assert_eq!(access.current(), addr(1));
    }

    #[test]
    fn test_transfer_ownership_to_null() {
        let mut access = AccessController::new(addr(1)).unwrap();

        let result = access.transfer_ownership(addr(0xAA), &addr(1), &Address::ZERO);
        assert_eq!(result, Err(TokenError::InvalidController(Address::ZERO)));
        assert_eq!(access.current(), addr(1));
    }
}
