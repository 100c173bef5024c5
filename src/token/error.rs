//! Token errors
//!
//! Every failure leaves state untouched and emits no event.

use crate::crypto::Address;
use crate::token::amount::{Amount, AmountError};
use thiserror::Error;

/// Token-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Amount, available: Amount },
    #[error("Insufficient allowance: required {required}, available {available}")]
    InsufficientAllowance { required: Amount, available: Amount },
    #[error("Unauthorized account: {0}")]
    Unauthorized(Address),
    #[error("Invalid sender: {0}")]
    InvalidSender(Address),
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(Address),
    #[error("Invalid spender: {0}")]
    InvalidSpender(Address),
    #[error("Invalid controller: {0}")]
    InvalidController(Address),
    #[error("Arithmetic error: {0}")]
    Arithmetic(#[from] AmountError),
    #[error("Inconsistent token state: {0}")]
    InconsistentState(String),
    #[error("Token not found: {0}")]
    TokenNotFound(String),
    #[error("Token already exists: {0}")]
    TokenAlreadyExists(String),
}
