//! Canonical blocks, transactions and account balances.

use crate::identifiers::{BlockIdentifier, Peer, SyncStatus, TransactionIdentifier};
use crate::ops::{Amount, Operation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A canonical transaction: identifier plus ordered operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Content hash, or the block hash for the reward pseudo-transaction.
    pub transaction_identifier: TransactionIdentifier,
    /// Balance-affecting operations, indices strictly increasing from zero.
    pub operations: Vec<Operation>,
    /// Gas limit, gas price, raw receipt and raw trace where applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// A canonical block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// This block.
    pub block_identifier: BlockIdentifier,
    /// The parent block. Genesis points at itself.
    pub parent_block_identifier: BlockIdentifier,
    /// Milliseconds since the epoch.
    pub timestamp: i64,
    /// Reward pseudo-transaction first, then the block's transactions in order.
    pub transactions: Vec<Transaction>,
}

/// An account balance proven against a specific block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Balances at the proven block. Always a single native-currency entry.
    pub balances: Vec<Amount>,
    /// The block the balance was read at.
    pub block_identifier: BlockIdentifier,
    /// Account nonce and contract code read in the same query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Current network view for the status surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStatus {
    /// Tip of the chain as the node sees it.
    pub current_block_identifier: BlockIdentifier,
    /// Tip timestamp, milliseconds since the epoch.
    pub current_block_timestamp: i64,
    /// The configured genesis block.
    pub genesis_block_identifier: BlockIdentifier,
    /// Sync progress, absent when the node is caught up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_status: Option<SyncStatus>,
    /// Connected peers.
    pub peers: Vec<Peer>,
}
