//! Chain parameters the translation layer depends on.

use crate::identifiers::BlockIdentifier;

/// Height of the genesis block.
pub const GENESIS_BLOCK_INDEX: i64 = 0;

/// Gas consumed by a plain value transfer.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Denominator of the miner's per-uncle inclusion bonus.
pub const UNCLE_REWARD_MULTIPLIER: u64 = 32;

/// Maximum depth at which an uncle may be included.
pub const MAX_UNCLE_DEPTH: i64 = 8;

/// Block reward before Byzantium, in wei.
pub const FRONTIER_BLOCK_REWARD: u128 = 5_000_000_000_000_000_000;

/// Block reward from Byzantium, in wei.
pub const BYZANTIUM_BLOCK_REWARD: u128 = 3_000_000_000_000_000_000;

/// Block reward from Constantinople, in wei.
pub const CONSTANTINOPLE_BLOCK_REWARD: u128 = 2_000_000_000_000_000_000;

/// Balances can be proven at historical blocks.
pub const HISTORICAL_BALANCE_SUPPORTED: bool = true;

/// Whether the gateway may reach the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Node-backed endpoints are served.
    Online,
    /// Only node-independent endpoints are served.
    Offline,
}

impl Mode {
    /// Whether node-backed endpoints are available.
    pub const fn is_online(&self) -> bool {
        matches!(self, Mode::Online)
    }
}

/// Static parameters of one supported network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSpec {
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// Byzantium activation height, if the fork is scheduled.
    pub byzantium_block: Option<i64>,
    /// Constantinople activation height, if the fork is scheduled.
    pub constantinople_block: Option<i64>,
    /// Genesis block hash.
    pub genesis_hash: String,
}

impl ChainSpec {
    /// Whether Byzantium is active at `height`.
    pub fn is_byzantium(&self, height: i64) -> bool {
        self.byzantium_block.is_some_and(|b| b <= height)
    }

    /// Whether Constantinople is active at `height`.
    pub fn is_constantinople(&self, height: i64) -> bool {
        self.constantinople_block.is_some_and(|b| b <= height)
    }

    /// The genesis block identifier.
    pub fn genesis_block_identifier(&self) -> BlockIdentifier {
        BlockIdentifier { index: GENESIS_BLOCK_INDEX, hash: self.genesis_hash.clone() }
    }
}

/// Ethereum mainnet.
pub fn mainnet() -> ChainSpec {
    ChainSpec {
        chain_id: 1,
        byzantium_block: Some(4_370_000),
        constantinople_block: Some(7_280_000),
        genesis_hash: "0xd4e56740f876aef8c010b86a40d5f56745a118d0906a34e69aec8c0db1cb8fa3"
            .to_owned(),
    }
}

/// Goerli testnet. All pre-merge forks active from genesis.
pub fn goerli() -> ChainSpec {
    ChainSpec {
        chain_id: 5,
        byzantium_block: Some(0),
        constantinople_block: Some(0),
        genesis_hash: "0xbf7e331f7f7c1dd2e05159666b3bf8bc7a8a3a9eb1d518969eab529dd9b88c1a"
            .to_owned(),
    }
}

/// Sepolia testnet. All pre-merge forks active from genesis.
pub fn sepolia() -> ChainSpec {
    ChainSpec {
        chain_id: 11_155_111,
        byzantium_block: Some(0),
        constantinople_block: Some(0),
        genesis_hash: "0x25a5cc106eea7138acab33231d7160d69cb777ee0c2c553fcddf5138993e6dd9"
            .to_owned(),
    }
}
