//! Intermediate artifacts passed between construction steps.
//!
//! Each artifact round-trips through the caller as JSON, so the field names
//! here are part of the wire contract.

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use rosetta_geth_types::{AccountIdentifier, Operation};
use serde::{Deserialize, Serialize};

/// Signature scheme requested from signers.
pub const ECDSA_RECOVERY: &str = "ecdsa_recovery";

/// Output of preprocess, input to metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessOptions {
    /// Checksummed sender address.
    pub from: String,
}

/// Node-derived metadata needed to build the unsigned transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionMetadata {
    /// Sender's pending nonce.
    pub nonce: U64,
    /// Suggested gas price, wei per gas.
    pub gas_price: U256,
}

/// The unsigned transfer, between payloads and combine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    /// Checksummed sender address.
    pub from: String,
    /// Checksummed recipient address.
    pub to: String,
    /// Transferred value in wei.
    pub value: U256,
    /// Call data. Empty for plain transfers.
    pub data: Bytes,
    /// Sender nonce.
    pub nonce: U64,
    /// Gas price, wei per gas.
    pub gas_price: U256,
    /// Gas limit.
    #[serde(rename = "gas")]
    pub gas_limit: U64,
    /// EIP-155 chain id the signature commits to.
    pub chain_id: U256,
}

/// The signed transfer, between combine and submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    /// Sender address, as carried by the sealing step. Parsing recovers
    /// the signer from the signature instead of trusting this field.
    pub from: Address,
    /// Sender nonce.
    pub nonce: U64,
    /// Gas price, wei per gas.
    pub gas_price: U256,
    /// Gas limit.
    #[serde(rename = "gas")]
    pub gas_limit: U64,
    /// Recipient address.
    pub to: Address,
    /// Transferred value in wei.
    pub value: U256,
    /// Call data.
    pub input: Bytes,
    /// EIP-155 `v`: recovery id folded with the chain id.
    pub v: U256,
    /// Signature `r`.
    pub r: U256,
    /// Signature `s`.
    pub s: U256,
    /// Content hash of the signed encoding.
    pub hash: B256,
}

/// One payload a signer must sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningPayload {
    /// Account whose key must sign.
    pub account_identifier: AccountIdentifier,
    /// Hash to sign, unprefixed hex.
    pub hex_bytes: String,
    /// Always [`ECDSA_RECOVERY`].
    pub signature_type: String,
}

/// Output of parsing a transaction back into intent form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTransaction {
    /// The transfer pair the transaction encodes.
    pub operations: Vec<Operation>,
    /// The recovered signer. Empty for unsigned transactions.
    pub signers: Vec<AccountIdentifier>,
    /// Remaining transaction fields.
    pub metadata: ParseMetadata,
}

/// Transaction fields surfaced alongside parsed operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseMetadata {
    /// Sender nonce.
    pub nonce: U64,
    /// Gas price, wei per gas.
    pub gas_price: U256,
    /// Chain id the transaction commits to.
    pub chain_id: U256,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_transaction_round_trips_with_wire_names() {
        let tx = UnsignedTransaction {
            from: "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".to_owned(),
            to: "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359".to_owned(),
            value: U256::from(1_000_000u64),
            data: Bytes::new(),
            nonce: U64::from(7u64),
            gas_price: U256::from(20_000_000_000u64),
            gas_limit: U64::from(21_000u64),
            chain_id: U256::from(1u64),
        };

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["from"], tx.from);
        assert_eq!(json["nonce"], "0x7");
        assert_eq!(json["gas"], "0x5208");
        assert_eq!(json["gas_price"], "0x4a817c800");
        assert_eq!(json["chain_id"], "0x1");

        let back: UnsignedTransaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn signed_transaction_uses_camel_case_names() {
        let tx = SignedTransaction {
            from: Address::with_last_byte(1),
            nonce: U64::from(7u64),
            gas_price: U256::from(20_000_000_000u64),
            gas_limit: U64::from(21_000u64),
            to: Address::with_last_byte(2),
            value: U256::from(5u64),
            input: Bytes::new(),
            v: U256::from(37u64),
            r: U256::from(1u64),
            s: U256::from(2u64),
            hash: B256::ZERO,
        };

        let json = serde_json::to_value(&tx).unwrap();
        assert!(json.get("gasPrice").is_some());
        assert!(json.get("gas").is_some());
        assert!(json.get("input").is_some());
        assert!(json.get("gas_price").is_none());

        let back: SignedTransaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }
}
