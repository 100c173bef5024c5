//! Token events and their fan-out
//!
//! Events are produced by committed state changes only. Subscribers receive
//! them through a broadcast channel in commit order.

use crate::crypto::Address;
use crate::token::amount::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Maximum number of events buffered per subscriber
const BROADCAST_CAPACITY: usize = 256;

/// Transfer event (emitted on transfer, transferFrom and mint)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TransferEvent {
    pub token: Address,
    /// `Address::ZERO` for minted tokens
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
}

/// Approval event (emitted when allowance is set)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ApprovalEvent {
    pub token: Address,
    pub owner: Address,
    pub spender: Address,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
}

/// Ownership transfer event
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OwnershipTransferredEvent {
    pub token: Address,
    pub previous: Address,
    pub new: Address,
    pub timestamp: DateTime<Utc>,
}

/// Any event a token can emit
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum TokenEvent {
    Transfer(TransferEvent),
    Approval(ApprovalEvent),
    OwnershipTransferred(OwnershipTransferredEvent),
}

impl TokenEvent {
    /// Short event name
    pub fn name(&self) -> &'static str {
        match self {
            TokenEvent::Transfer(_) => "Transfer",
            TokenEvent::Approval(_) => "Approval",
            TokenEvent::OwnershipTransferred(_) => "OwnershipTransferred",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            TokenEvent::Transfer(e) => e.timestamp,
            TokenEvent::Approval(e) => e.timestamp,
            TokenEvent::OwnershipTransferred(e) => e.timestamp,
        }
    }
}

impl From<TransferEvent> for TokenEvent {
    fn from(event: TransferEvent) -> Self {
        TokenEvent::Transfer(event)
    }
}

impl From<ApprovalEvent> for TokenEvent {
    fn from(event: ApprovalEvent) -> Self {
        TokenEvent::Approval(event)
    }
}

impl From<OwnershipTransferredEvent> for TokenEvent {
    fn from(event: OwnershipTransferredEvent) -> Self {
        TokenEvent::OwnershipTransferred(event)
    }
}

/// Broadcaster for token events
#[derive(Debug)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<TokenEvent>,
}

impl EventBroadcaster {
    /// Create a new broadcaster
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    /// Broadcast an event to all subscribers
    pub fn broadcast(&self, event: TokenEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<TokenEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
