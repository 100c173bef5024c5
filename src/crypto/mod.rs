//! Cryptographic primitives for account identities
//!
//! This module provides:
//! - SHA-256 hashing
//! - secp256k1 key management
//! - 20-byte account addresses

pub mod address;
pub mod hash;
pub mod keys;

pub use address::{Address, AddressError};
pub use hash::{sha256, sha256_hex};
pub use keys::{KeyError, KeyPair};
