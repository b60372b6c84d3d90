#![warn(missing_debug_implementations, missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(no_crate_inject, attr(deny(warnings), allow(dead_code, unused_variables))))]

//! Canonical ledger types for the rosetta-geth gateway.
//!
//! Everything in this crate is part of the externally visible wire surface:
//! identifiers, operations, blocks, the error catalog and the `/call`
//! parameter schemas. The field names and JSON shapes here are load-bearing
//! and must not drift.

mod address;
mod block;
mod call;
mod chain;
mod error;
mod identifiers;
mod ops;

pub use address::checksum_address;
pub use block::{AccountBalance, Block, NetworkStatus, Transaction};
pub use call::{CallParams, CallParseError, CallRequest, CallResponse, CALL_METHODS};
pub use chain::{
    goerli, mainnet, sepolia, ChainSpec, Mode, BYZANTIUM_BLOCK_REWARD,
    CONSTANTINOPLE_BLOCK_REWARD, FRONTIER_BLOCK_REWARD, GENESIS_BLOCK_INDEX,
    HISTORICAL_BALANCE_SUPPORTED, MAX_UNCLE_DEPTH, TRANSFER_GAS_LIMIT, UNCLE_REWARD_MULTIPLIER,
};
pub use error::{ApiError, ErrorDetail};
pub use identifiers::{
    AccountIdentifier, BlockIdentifier, OperationIdentifier, PartialBlockIdentifier, Peer,
    SyncStatus, TransactionIdentifier,
};
pub use ops::{
    is_call_family, is_create_type, Amount, Currency, OpStatus, OpType, Operation, ETH_DECIMALS,
    ETH_SYMBOL,
};
