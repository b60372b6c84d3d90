#![warn(missing_debug_implementations, missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(no_crate_inject, attr(deny(warnings), allow(dead_code, unused_variables))))]

//! Node fetch layer and ledger translation for the rosetta-geth gateway.
//!
//! [`EthClient`] turns raw node responses into canonical blocks and
//! transactions: it batches dependent fetches, flattens call traces into
//! ordered operations, attributes fees and rewards, and proves balances
//! atomically through the node's GraphQL interface.

mod client;
mod error;
mod fee;
mod reward;
mod synthesize;
mod trace;
mod transport;
mod types;

pub use client::EthClient;
pub use error::ClientError;
pub use fee::effective_gas_price;
pub use reward::{block_reward_transaction, mining_reward};
pub use synthesize::{BurnPolicy, OpSynthesizer, SinkBurnPolicy};
pub use trace::{flatten, FlatFrame, TraceFrame, TraceGuard, MAX_TRACE_CONCURRENCY};
pub use transport::{
    BatchCall, GraphQl, GraphQlTransport, HttpTransport, JsonRpc, TransportError,
};
pub use types::{
    RpcBlockBody, RpcHeader, RpcPeerInfo, RpcReceipt, RpcSyncProgress, RpcTransaction,
    TxPoolContent, TxPoolEntry,
};
