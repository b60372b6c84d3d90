//! Identifier objects referenced by every other wire type.

use serde::{Deserialize, Serialize};

/// Uniquely identifies a canonical block by height and hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockIdentifier {
    /// Block height.
    pub index: i64,
    /// Block hash, `0x`-prefixed lowercase hex.
    pub hash: String,
}

/// Block reference where either side, or both, may be omitted.
///
/// An empty reference means "latest". When both sides are set, `hash` wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialBlockIdentifier {
    /// Block height, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    /// Block hash, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl PartialBlockIdentifier {
    /// Reference by height only.
    pub fn from_index(index: i64) -> Self {
        Self { index: Some(index), hash: None }
    }

    /// Reference by hash only.
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self { index: None, hash: Some(hash.into()) }
    }
}

/// Identifies a transaction by content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIdentifier {
    /// Transaction hash, `0x`-prefixed lowercase hex.
    pub hash: String,
}

/// Identifies an account by address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentifier {
    /// EIP-55 checksummed address.
    pub address: String,
}

/// Position of one operation within a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationIdentifier {
    /// Zero-based index, strictly increasing within the transaction.
    pub index: i64,
}

/// Catch-up progress reported while the node is syncing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// Height the node has processed up to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_index: Option<i64>,
    /// Height the node is syncing towards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_index: Option<i64>,
}

/// A connected peer as reported by the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    /// Node-assigned peer id.
    pub peer_id: String,
    /// Everything else the node reports about the peer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}
