//! Node wire shapes the translation layer consumes.

use alloy_primitives::{b256, Address, Bytes, B256, U256, U64};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Uncle hash of a block with no uncles: `keccak256(rlp([]))`.
pub(crate) const EMPTY_UNCLE_HASH: B256 =
    b256!("1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347");

/// Root of an empty trie.
pub(crate) const EMPTY_ROOT: B256 =
    b256!("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421");

/// Header fields of a node-reported block. Uncle headers share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcHeader {
    /// Block hash.
    pub hash: B256,
    /// Parent block hash.
    pub parent_hash: B256,
    /// Hash over the uncle list.
    pub sha3_uncles: B256,
    /// Root of the transaction trie.
    pub transactions_root: B256,
    /// Block beneficiary.
    pub miner: Address,
    /// Block height.
    pub number: U64,
    /// Seconds since the epoch.
    pub timestamp: U64,
    /// Base fee per gas, present from London onward.
    #[serde(default)]
    pub base_fee_per_gas: Option<U256>,
}

impl RpcHeader {
    /// Block height as a signed index.
    pub fn height(&self) -> i64 {
        self.number.to::<u64>() as i64
    }
}

/// Body fields decoded from the same raw payload as [`RpcHeader`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlockBody {
    /// Block hash, repeated here so body and header can be cross-checked.
    pub hash: B256,
    /// Full transaction objects, in block order.
    pub transactions: Vec<RpcTransaction>,
    /// Uncle header hashes.
    pub uncles: Vec<B256>,
}

/// A node-reported transaction, including the out-of-band fields the node
/// attaches when the transaction is loaded from a block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    /// Transaction hash.
    pub hash: B256,
    /// Sender nonce.
    pub nonce: U64,
    /// Gas limit.
    pub gas: U64,
    /// Offered gas price. For fee-market transactions the node reports the
    /// effective price here.
    #[serde(default)]
    pub gas_price: Option<U256>,
    /// EIP-1559 fee cap.
    #[serde(default)]
    pub max_fee_per_gas: Option<U256>,
    /// EIP-1559 tip cap.
    #[serde(default)]
    pub max_priority_fee_per_gas: Option<U256>,
    /// Recipient. Absent for contract creation.
    #[serde(default)]
    pub to: Option<Address>,
    /// Transferred value in wei.
    pub value: U256,
    /// Call data.
    pub input: Bytes,
    /// Typed-transaction envelope kind.
    #[serde(default, rename = "type")]
    pub transaction_type: Option<U64>,
    /// Sender, attached by the node when loaded from a block.
    #[serde(default)]
    pub from: Option<Address>,
    /// Containing block hash, absent while pending.
    #[serde(default)]
    pub block_hash: Option<B256>,
    /// Containing block height, absent while pending.
    #[serde(default)]
    pub block_number: Option<U64>,
}

/// A node-reported transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    /// Hash of the receipted transaction.
    pub transaction_hash: B256,
    /// Block the receipt was issued in.
    pub block_hash: B256,
    /// Height of that block.
    pub block_number: U64,
    /// Gas consumed by this transaction alone.
    pub gas_used: U256,
    /// Execution status, absent pre-Byzantium.
    #[serde(default)]
    pub status: Option<U64>,
}

/// `eth_syncing` progress object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcSyncProgress {
    /// Height the sync started at.
    pub starting_block: U64,
    /// Height processed so far.
    pub current_block: U64,
    /// Height being synced towards.
    pub highest_block: U64,
}

/// `txpool_content` result: address, then nonce, then transaction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TxPoolContent {
    /// Executable transactions.
    #[serde(default)]
    pub pending: BTreeMap<String, BTreeMap<String, TxPoolEntry>>,
    /// Transactions waiting on a nonce gap.
    #[serde(default)]
    pub queued: BTreeMap<String, BTreeMap<String, TxPoolEntry>>,
}

impl TxPoolContent {
    /// All pool transaction hashes, pending before queued.
    pub fn hashes(&self) -> Vec<B256> {
        self.pending
            .values()
            .chain(self.queued.values())
            .flat_map(|by_nonce| by_nonce.values())
            .map(|entry| entry.hash)
            .collect()
    }
}

/// The one field of a pool transaction the mempool surface needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TxPoolEntry {
    /// Transaction hash.
    pub hash: B256,
}

/// `admin_peers` result element.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcPeerInfo {
    /// Node-assigned peer id.
    pub id: String,
    /// Client name and version.
    #[serde(default)]
    pub name: String,
    /// Enode URL.
    #[serde(default)]
    pub enode: String,
    /// ENR record, if the peer advertised one.
    #[serde(default)]
    pub enr: Option<String>,
    /// Advertised capabilities.
    #[serde(default)]
    pub caps: Vec<String>,
    /// Per-protocol details, passed through untyped.
    #[serde(default)]
    pub protocols: Value,
}
