#![warn(missing_debug_implementations, missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(no_crate_inject, attr(deny(warnings), allow(dead_code, unused_variables))))]

//! Stateless transaction construction for the rosetta-geth gateway.
//!
//! [`ConstructionService`] drives the seven-step flow from key derivation to
//! broadcast. Every step is a pure function over its inputs except
//! `metadata` and `submit`, which reach the node through [`TxBackend`] and
//! are refused while offline.

mod eip155;
mod error;
mod matcher;
mod service;
mod types;

pub use eip155::public_key_to_address;
pub use error::ConstructionError;
pub use matcher::{match_transfer, TransferIntent};
pub use service::{ConstructionService, TxBackend};
pub use types::{
    ConstructionMetadata, ParseMetadata, ParsedTransaction, PreprocessOptions, SignedTransaction,
    SigningPayload, UnsignedTransaction, ECDSA_RECOVERY,
};
