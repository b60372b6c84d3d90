//! Legacy transaction encoding, signing hashes and sender recovery.

use crate::error::ConstructionError;
use crate::types::{SignedTransaction, UnsignedTransaction};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{Encodable, RlpEncodable};
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, PublicKey, SECP256K1,
};

/// `v` replays protection offset: `chain_id * 2 + 35 + recovery_id`.
const EIP155_V_OFFSET: u64 = 35;

#[derive(RlpEncodable)]
struct Eip155SigningFields {
    nonce: u64,
    gas_price: U256,
    gas_limit: u64,
    to: Address,
    value: U256,
    data: Bytes,
    chain_id: u64,
    zero_r: u8,
    zero_s: u8,
}

#[derive(RlpEncodable)]
struct LegacySigningFields {
    nonce: u64,
    gas_price: U256,
    gas_limit: u64,
    to: Address,
    value: U256,
    data: Bytes,
}

#[derive(RlpEncodable)]
struct LegacyTxFields {
    nonce: u64,
    gas_price: U256,
    gas_limit: u64,
    to: Address,
    value: U256,
    data: Bytes,
    v: U256,
    r: U256,
    s: U256,
}

#[allow(clippy::too_many_arguments)]
fn sighash(
    nonce: u64,
    gas_price: U256,
    gas_limit: u64,
    to: Address,
    value: U256,
    data: &Bytes,
    chain_id: Option<u64>,
) -> B256 {
    let mut buf = Vec::new();
    match chain_id {
        Some(chain_id) => Eip155SigningFields {
            nonce,
            gas_price,
            gas_limit,
            to,
            value,
            data: data.clone(),
            chain_id,
            zero_r: 0,
            zero_s: 0,
        }
        .encode(&mut buf),
        None => LegacySigningFields { nonce, gas_price, gas_limit, to, value, data: data.clone() }
            .encode(&mut buf),
    }
    keccak256(&buf)
}

/// The EIP-155 signing hash of an unsigned transfer.
pub(crate) fn signing_hash(tx: &UnsignedTransaction) -> Result<B256, ConstructionError> {
    let to: Address =
        tx.to.parse().map_err(|_| ConstructionError::InvalidAddress(tx.to.clone()))?;
    Ok(sighash(
        tx.nonce.to(),
        tx.gas_price,
        tx.gas_limit.to(),
        to,
        tx.value,
        &tx.data,
        Some(tx.chain_id.to()),
    ))
}

/// The raw RLP encoding of a signed transaction, ready for broadcast.
pub(crate) fn encode_signed(tx: &SignedTransaction) -> Vec<u8> {
    let mut buf = Vec::new();
    LegacyTxFields {
        nonce: tx.nonce.to(),
        gas_price: tx.gas_price,
        gas_limit: tx.gas_limit.to(),
        to: tx.to,
        value: tx.value,
        data: tx.input.clone(),
        v: tx.v,
        r: tx.r,
        s: tx.s,
    }
    .encode(&mut buf);
    buf
}

/// Content hash of the signed encoding: the transaction identifier.
pub(crate) fn transaction_hash(tx: &SignedTransaction) -> B256 {
    keccak256(encode_signed(tx))
}

/// Splits a 65-byte `r ‖ s ‖ recovery_id` signature into transaction
/// signature values, folding the recovery id into an EIP-155 `v`.
pub(crate) fn signature_values(
    signature: &[u8],
    chain_id: u64,
) -> Result<(U256, U256, U256), ConstructionError> {
    if signature.len() != 65 {
        return Err(ConstructionError::InvalidSignature(format!(
            "expected 65 signature bytes, got {}",
            signature.len()
        )));
    }
    let recovery_id = RecoveryId::from_i32(signature[64] as i32)
        .map_err(|err| ConstructionError::InvalidSignature(err.to_string()))?;
    RecoverableSignature::from_compact(&signature[..64], recovery_id)
        .map_err(|err| ConstructionError::InvalidSignature(err.to_string()))?;

    let r = U256::from_be_slice(&signature[..32]);
    let s = U256::from_be_slice(&signature[32..64]);
    let v = U256::from(chain_id * 2 + EIP155_V_OFFSET + signature[64] as u64);
    Ok((r, s, v))
}

/// Recovery id and chain id folded into a legacy `v` value.
///
/// Pre-EIP-155 values 27 and 28 are accepted and carry no chain id.
pub(crate) fn split_v(v: U256) -> Result<(u8, Option<u64>), ConstructionError> {
    let v: u64 = v
        .try_into()
        .map_err(|_| ConstructionError::InvalidSignature(format!("v out of range: {v}")))?;
    match v {
        27 | 28 => Ok(((v - 27) as u8, None)),
        v if v >= EIP155_V_OFFSET => {
            Ok((((v - EIP155_V_OFFSET) % 2) as u8, Some((v - EIP155_V_OFFSET) / 2)))
        }
        other => Err(ConstructionError::InvalidSignature(format!("invalid v value: {other}"))),
    }
}

/// Recovers the sender of a signed legacy transaction from its signature.
pub(crate) fn recover_sender(tx: &SignedTransaction) -> Result<Address, ConstructionError> {
    let (recovery_id, chain_id) = split_v(tx.v)?;
    let hash =
        sighash(tx.nonce.to(), tx.gas_price, tx.gas_limit.to(), tx.to, tx.value, &tx.input, chain_id);

    let mut compact = [0u8; 64];
    compact[..32].copy_from_slice(&tx.r.to_be_bytes::<32>());
    compact[32..].copy_from_slice(&tx.s.to_be_bytes::<32>());
    let signature = RecoverableSignature::from_compact(
        &compact,
        RecoveryId::from_i32(recovery_id as i32)
            .map_err(|err| ConstructionError::InvalidSignature(err.to_string()))?,
    )
    .map_err(|err| ConstructionError::InvalidSignature(err.to_string()))?;

    let message = Message::from_slice(hash.as_slice())
        .map_err(|err| ConstructionError::InvalidSignature(err.to_string()))?;
    let public = SECP256K1
        .recover_ecdsa(&message, &signature)
        .map_err(|err| ConstructionError::InvalidSignature(err.to_string()))?;
    Ok(public_key_to_address(&public))
}

/// Converts a public key into an address: the last 20 bytes of the keccak
/// hash over the uncompressed point, tag byte dropped.
pub fn public_key_to_address(public: &PublicKey) -> Address {
    let hash = keccak256(&public.serialize_uncompressed()[1..]);
    Address::from_slice(&hash[12..])
}
