//! Block reward attribution.

use crate::types::RpcHeader;
use alloy_primitives::{Address, U256};
use rosetta_geth_types::{
    Amount, BlockIdentifier, ChainSpec, OpStatus, OpType, Operation, OperationIdentifier,
    Transaction, TransactionIdentifier, BYZANTIUM_BLOCK_REWARD, CONSTANTINOPLE_BLOCK_REWARD,
    FRONTIER_BLOCK_REWARD, GENESIS_BLOCK_INDEX, MAX_UNCLE_DEPTH, UNCLE_REWARD_MULTIPLIER,
};

/// Base mining reward at `height`, by fork schedule. Genesis pays nothing.
pub fn mining_reward(height: i64, chain: &ChainSpec) -> U256 {
    if height == GENESIS_BLOCK_INDEX {
        return U256::ZERO;
    }
    let mut reward = U256::from(FRONTIER_BLOCK_REWARD);
    if chain.is_byzantium(height) {
        reward = U256::from(BYZANTIUM_BLOCK_REWARD);
    }
    if chain.is_constantinople(height) {
        reward = U256::from(CONSTANTINOPLE_BLOCK_REWARD);
    }
    reward
}

/// The reward pseudo-transaction of a block.
///
/// Its identifier is the block hash. Operation 0 credits the miner the base
/// reward plus `reward * uncle_count / 32`, then each uncle miner is credited
/// `(uncle_height + 8 - block_height) * (reward / 8)`, all in integer
/// arithmetic.
pub fn block_reward_transaction(
    chain: &ChainSpec,
    block: &BlockIdentifier,
    miner: &Address,
    uncles: &[RpcHeader],
) -> Transaction {
    let reward = mining_reward(block.index, chain);
    let mut miner_reward = reward;
    if !uncles.is_empty() {
        miner_reward += reward * U256::from(uncles.len()) / U256::from(UNCLE_REWARD_MULTIPLIER);
    }

    let mut operations = vec![Operation {
        operation_identifier: OperationIdentifier { index: 0 },
        related_operations: None,
        op_type: OpType::MinerReward.as_str().to_owned(),
        status: Some(OpStatus::Success),
        account: rosetta_geth_types::AccountIdentifier { address: miner.to_checksum(None) },
        amount: Some(Amount::wei(miner_reward.to_string())),
        metadata: None,
    }];

    for uncle in uncles {
        let depth_factor = (uncle.height() + MAX_UNCLE_DEPTH - block.index).max(0);
        let uncle_reward = U256::from(depth_factor as u64) * (reward / U256::from(MAX_UNCLE_DEPTH as u64));
        operations.push(Operation {
            operation_identifier: OperationIdentifier { index: operations.len() as i64 },
            related_operations: None,
            op_type: OpType::UncleReward.as_str().to_owned(),
            status: Some(OpStatus::Success),
            account: rosetta_geth_types::AccountIdentifier {
                address: uncle.miner.to_checksum(None),
            },
            amount: Some(Amount::wei(uncle_reward.to_string())),
            metadata: None,
        });
    }

    Transaction {
        transaction_identifier: TransactionIdentifier { hash: block.hash.clone() },
        operations,
        metadata: None,
    }
}
