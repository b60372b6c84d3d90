//! The construction pipeline.

use crate::eip155;
use crate::error::ConstructionError;
use crate::matcher::match_transfer;
use crate::types::{
    ConstructionMetadata, ParseMetadata, ParsedTransaction, PreprocessOptions, SignedTransaction,
    SigningPayload, UnsignedTransaction, ECDSA_RECOVERY,
};
use alloy_primitives::{Address, Bytes, B256, U256, U64};
use async_trait::async_trait;
use rosetta_geth_client::{ClientError, EthClient, GraphQl, JsonRpc};
use rosetta_geth_types::{
    checksum_address, AccountIdentifier, Amount, ChainSpec, Mode, OpType, Operation,
    OperationIdentifier, TransactionIdentifier, TRANSFER_GAS_LIMIT,
};
use secp256k1::PublicKey;
use tracing::debug;

/// Node capabilities the pipeline needs while online.
#[async_trait]
pub trait TxBackend: Send + Sync {
    /// The sender's next nonce, including pool transactions.
    async fn pending_nonce(&self, address: Address) -> Result<u64, ClientError>;

    /// The node's suggested gas price.
    async fn suggest_gas_price(&self) -> Result<U256, ClientError>;

    /// Broadcasts a signed raw transaction.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<(), ClientError>;
}

#[async_trait]
impl<P: JsonRpc, G: GraphQl> TxBackend for EthClient<P, G> {
    async fn pending_nonce(&self, address: Address) -> Result<u64, ClientError> {
        EthClient::pending_nonce(self, address).await
    }

    async fn suggest_gas_price(&self) -> Result<U256, ClientError> {
        EthClient::suggest_gas_price(self).await
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<(), ClientError> {
        EthClient::send_raw_transaction(self, raw).await
    }
}

/// Drives the construction flow from key derivation to broadcast.
///
/// Every step is stateless; intermediate artifacts travel with the caller.
#[derive(Debug)]
pub struct ConstructionService<C> {
    backend: C,
    mode: Mode,
    chain: ChainSpec,
}

// === impl ConstructionService ===

impl<C> ConstructionService<C> {
    /// A service over `backend` for `chain`, honoring `mode`.
    pub fn new(backend: C, mode: Mode, chain: ChainSpec) -> Self {
        Self { backend, mode, chain }
    }

    /// Converts public key bytes into a checksummed account address.
    pub fn derive(&self, public_key: &[u8]) -> Result<AccountIdentifier, ConstructionError> {
        let key =
            PublicKey::from_slice(public_key).map_err(ConstructionError::InvalidPublicKey)?;
        let address = eip155::public_key_to_address(&key).to_checksum(None);
        Ok(AccountIdentifier { address })
    }

    /// Validates the intent and extracts the options metadata will need.
    pub fn preprocess(
        &self,
        operations: &[Operation],
    ) -> Result<PreprocessOptions, ConstructionError> {
        let intent = match_transfer(operations)?;
        let from = checksum_address(&intent.from)
            .ok_or_else(|| ConstructionError::InvalidAddress(intent.from.clone()))?;
        checksum_address(&intent.to)
            .ok_or_else(|| ConstructionError::InvalidAddress(intent.to.clone()))?;
        Ok(PreprocessOptions { from })
    }

    /// Builds the unsigned transaction and its single signing payload.
    pub fn payloads(
        &self,
        operations: &[Operation],
        metadata: &ConstructionMetadata,
    ) -> Result<(UnsignedTransaction, SigningPayload), ConstructionError> {
        let intent = match_transfer(operations)?;
        let from = checksum_address(&intent.from)
            .ok_or_else(|| ConstructionError::InvalidAddress(intent.from.clone()))?;
        let to = checksum_address(&intent.to)
            .ok_or_else(|| ConstructionError::InvalidAddress(intent.to.clone()))?;

        let unsigned = UnsignedTransaction {
            from: from.clone(),
            to,
            value: intent.value,
            data: Bytes::new(),
            nonce: metadata.nonce,
            gas_price: metadata.gas_price,
            gas_limit: U64::from(TRANSFER_GAS_LIMIT),
            chain_id: U256::from(self.chain.chain_id),
        };
        let hash = eip155::signing_hash(&unsigned)?;

        let payload = SigningPayload {
            account_identifier: AccountIdentifier { address: from },
            hex_bytes: hex::encode(hash),
            signature_type: ECDSA_RECOVERY.to_owned(),
        };
        Ok((unsigned, payload))
    }

    /// Attaches a signature to an unsigned transaction.
    pub fn combine(
        &self,
        unsigned: &UnsignedTransaction,
        signatures: &[Vec<u8>],
    ) -> Result<SignedTransaction, ConstructionError> {
        let [signature] = signatures else {
            return Err(ConstructionError::InvalidSignature(format!(
                "expected 1 signature, got {}",
                signatures.len()
            )));
        };
        let chain_id: u64 = unsigned.chain_id.to();
        let (r, s, v) = eip155::signature_values(signature, chain_id)?;
        let from: Address = unsigned
            .from
            .parse()
            .map_err(|_| ConstructionError::InvalidAddress(unsigned.from.clone()))?;
        let to: Address = unsigned
            .to
            .parse()
            .map_err(|_| ConstructionError::InvalidAddress(unsigned.to.clone()))?;

        let mut signed = SignedTransaction {
            from,
            nonce: unsigned.nonce,
            gas_price: unsigned.gas_price,
            gas_limit: unsigned.gas_limit,
            to,
            value: unsigned.value,
            input: unsigned.data.clone(),
            v,
            r,
            s,
            hash: B256::ZERO,
        };
        signed.hash = eip155::transaction_hash(&signed);
        Ok(signed)
    }

    /// Parses a transaction back into intent form. For signed transactions
    /// the sender is recovered from the signature and reported as the signer.
    pub fn parse(
        &self,
        signed: bool,
        transaction: &str,
    ) -> Result<ParsedTransaction, ConstructionError> {
        if signed {
            let tx: SignedTransaction = serde_json::from_str(transaction)
                .map_err(|err| ConstructionError::InvalidIntermediate(err.to_string()))?;
            let sender = eip155::recover_sender(&tx)?;
            let from = sender.to_checksum(None);
            let to = tx.to.to_checksum(None);
            let (_, chain_id) = eip155::split_v(tx.v)?;

            Ok(ParsedTransaction {
                operations: transfer_operations(&from, &to, tx.value),
                signers: vec![AccountIdentifier { address: from }],
                metadata: ParseMetadata {
                    nonce: tx.nonce,
                    gas_price: tx.gas_price,
                    chain_id: U256::from(chain_id.unwrap_or(self.chain.chain_id)),
                },
            })
        } else {
            let tx: UnsignedTransaction = serde_json::from_str(transaction)
                .map_err(|err| ConstructionError::InvalidIntermediate(err.to_string()))?;
            let from = checksum_address(&tx.from)
                .ok_or_else(|| ConstructionError::InvalidAddress(tx.from.clone()))?;
            let to = checksum_address(&tx.to)
                .ok_or_else(|| ConstructionError::InvalidAddress(tx.to.clone()))?;

            Ok(ParsedTransaction {
                operations: transfer_operations(&from, &to, tx.value),
                signers: Vec::new(),
                metadata: ParseMetadata {
                    nonce: tx.nonce,
                    gas_price: tx.gas_price,
                    chain_id: tx.chain_id,
                },
            })
        }
    }

    /// Content hash of a signed transaction, recomputed from its fields.
    pub fn hash(&self, transaction: &str) -> Result<TransactionIdentifier, ConstructionError> {
        let tx: SignedTransaction = serde_json::from_str(transaction)
            .map_err(|err| ConstructionError::InvalidIntermediate(err.to_string()))?;
        Ok(TransactionIdentifier { hash: eip155::transaction_hash(&tx).to_string() })
    }
}

impl<C: TxBackend> ConstructionService<C> {
    /// Fetches the sender's pending nonce and a gas price suggestion.
    ///
    /// Refused while offline, before any input is inspected.
    pub async fn metadata(
        &self,
        options: &PreprocessOptions,
    ) -> Result<(ConstructionMetadata, Amount), ConstructionError> {
        if !self.mode.is_online() {
            return Err(ConstructionError::UnavailableOffline);
        }
        let from: Address = options
            .from
            .parse()
            .map_err(|_| ConstructionError::InvalidAddress(options.from.clone()))?;

        let nonce = self.backend.pending_nonce(from).await?;
        let gas_price = self.backend.suggest_gas_price().await?;
        let suggested_fee = Amount::wei((gas_price * U256::from(TRANSFER_GAS_LIMIT)).to_string());
        debug!(from = %options.from, nonce, "assembled construction metadata");

        Ok((ConstructionMetadata { nonce: U64::from(nonce), gas_price }, suggested_fee))
    }

    /// Broadcasts a signed transaction and returns its identifier.
    ///
    /// Refused while offline, before any input is inspected.
    pub async fn submit(
        &self,
        transaction: &str,
    ) -> Result<TransactionIdentifier, ConstructionError> {
        if !self.mode.is_online() {
            return Err(ConstructionError::UnavailableOffline);
        }
        let tx: SignedTransaction = serde_json::from_str(transaction)
            .map_err(|err| ConstructionError::InvalidIntermediate(err.to_string()))?;
        let raw = eip155::encode_signed(&tx);
        self.backend
            .send_raw_transaction(&raw)
            .await
            .map_err(|err| ConstructionError::Broadcast(err.to_string()))?;
        Ok(TransactionIdentifier { hash: eip155::transaction_hash(&tx).to_string() })
    }
}

/// The canonical operation pair of a native transfer intent.
fn transfer_operations(from: &str, to: &str, value: U256) -> Vec<Operation> {
    let debit = if value.is_zero() { "0".to_owned() } else { format!("-{value}") };
    vec![
        Operation {
            operation_identifier: OperationIdentifier { index: 0 },
            related_operations: None,
            op_type: OpType::Call.as_str().to_owned(),
            status: None,
            account: AccountIdentifier { address: from.to_owned() },
            amount: Some(Amount::wei(debit)),
            metadata: None,
        },
        Operation {
            operation_identifier: OperationIdentifier { index: 1 },
            related_operations: Some(vec![OperationIdentifier { index: 0 }]),
            op_type: OpType::Call.as_str().to_owned(),
            status: None,
            account: AccountIdentifier { address: to.to_owned() },
            amount: Some(Amount::wei(value.to_string())),
            metadata: None,
        },
    ]
}
