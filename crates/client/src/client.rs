//! The node client: batched fetches assembled into canonical objects.

use crate::error::ClientError;
use crate::fee::{effective_gas_price, fee_ops};
use crate::reward::block_reward_transaction;
use crate::synthesize::OpSynthesizer;
use crate::trace::{flatten, TraceFrame, TraceGuard};
use crate::transport::{BatchCall, GraphQl, JsonRpc, TransportError};
use crate::types::{
    RpcBlockBody, RpcHeader, RpcPeerInfo, RpcReceipt, RpcSyncProgress, RpcTransaction,
    TxPoolContent, EMPTY_ROOT, EMPTY_UNCLE_HASH,
};
use alloy_primitives::{Address, B256, U256};
use rosetta_geth_types::{
    AccountBalance, AccountIdentifier, Amount, Block, BlockIdentifier, CallParams, CallRequest,
    CallResponse, ChainSpec, NetworkStatus, PartialBlockIdentifier, Peer, SyncStatus, Transaction,
    TransactionIdentifier, GENESIS_BLOCK_INDEX,
};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Everything needed to render one transaction of a fetched block.
#[derive(Debug, Clone)]
pub(crate) struct LoadedTransaction {
    pub(crate) tx: RpcTransaction,
    pub(crate) sender: Address,
    pub(crate) gas_price: U256,
    pub(crate) fee_amount: U256,
    pub(crate) fee_burned: Option<U256>,
    pub(crate) miner: Address,
    pub(crate) raw_receipt: Value,
    pub(crate) trace: Option<TraceFrame>,
    pub(crate) raw_trace: Option<Value>,
}

impl LoadedTransaction {
    pub(crate) fn sender_account(&self) -> AccountIdentifier {
        AccountIdentifier { address: self.sender.to_checksum(None) }
    }

    pub(crate) fn miner_account(&self) -> AccountIdentifier {
        AccountIdentifier { address: self.miner.to_checksum(None) }
    }

    #[cfg(test)]
    pub(crate) fn for_tests(
        tx: RpcTransaction,
        fee_amount: U256,
        fee_burned: Option<U256>,
    ) -> Self {
        Self {
            sender: tx.from.unwrap_or_default(),
            gas_price: tx.gas_price.unwrap_or_default(),
            fee_amount,
            fee_burned,
            miner: Address::with_last_byte(0xfe),
            raw_receipt: Value::Null,
            trace: None,
            raw_trace: None,
            tx,
        }
    }
}

/// Fetches from the node and translates into canonical ledger objects.
#[derive(Debug)]
pub struct EthClient<P, G> {
    rpc: P,
    graphql: G,
    chain: ChainSpec,
    trace_guard: TraceGuard,
    trace_config: Value,
    synthesizer: OpSynthesizer,
    skip_admin_calls: bool,
}

// === impl EthClient ===

impl<P, G> EthClient<P, G> {
    /// A client over the given transports for `chain`.
    pub fn new(rpc: P, graphql: G, chain: ChainSpec) -> Self {
        Self {
            rpc,
            graphql,
            chain,
            trace_guard: TraceGuard::default(),
            trace_config: json!({ "tracer": "callTracer", "timeout": "300s" }),
            synthesizer: OpSynthesizer::default(),
            skip_admin_calls: false,
        }
    }

    /// Replaces the trace concurrency guard.
    pub fn with_trace_guard(mut self, guard: TraceGuard) -> Self {
        self.trace_guard = guard;
        self
    }

    /// Replaces the operation synthesizer.
    pub fn with_synthesizer(mut self, synthesizer: OpSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    /// Skips `admin_*` calls, for nodes that do not expose the namespace.
    pub fn with_skip_admin_calls(mut self, skip: bool) -> Self {
        self.skip_admin_calls = skip;
        self
    }

    /// The configured chain parameters.
    pub fn chain(&self) -> &ChainSpec {
        &self.chain
    }
}

impl<P: JsonRpc, G: GraphQl> EthClient<P, G> {
    /// Fetches the block referenced by `id` (latest when absent) and
    /// translates it into its canonical form.
    pub async fn block(&self, id: Option<&PartialBlockIdentifier>) -> Result<Block, ClientError> {
        let raw = match id {
            Some(PartialBlockIdentifier { hash: Some(hash), .. }) => {
                self.raw_object("eth_getBlockByHash", vec![json!(hash), json!(true)]).await?
            }
            Some(PartialBlockIdentifier { index: Some(index), .. }) => {
                self.raw_object("eth_getBlockByNumber", vec![block_num_arg(Some(*index)), json!(true)])
                    .await?
            }
            _ => {
                self.raw_object("eth_getBlockByNumber", vec![block_num_arg(None), json!(true)])
                    .await?
            }
        };

        // header and body decode from the same payload, then cross-check
        let header: RpcHeader = serde_json::from_value(raw.clone())?;
        let body: RpcBlockBody = serde_json::from_value(raw)?;
        self.assemble_block(header, body).await
    }

    /// Fetches one confirmed transaction of `block` and translates it.
    pub async fn block_transaction(
        &self,
        block: &BlockIdentifier,
        tx: &TransactionIdentifier,
    ) -> Result<Transaction, ClientError> {
        let expected_hash: B256 = block
            .hash
            .parse()
            .map_err(|_| ClientError::InvalidInput(format!("invalid block hash `{}`", block.hash)))?;

        let raw_tx = self.raw_object("eth_getTransactionByHash", vec![json!(tx.hash)]).await?;
        let rpc_tx: RpcTransaction = serde_json::from_value(raw_tx)?;
        let containing = rpc_tx.block_hash.ok_or(ClientError::NotFound)?;
        if containing != expected_hash {
            warn!(expected = %expected_hash, got = %containing, "transaction moved blocks");
            return Err(ClientError::BlockOrphaned {
                expected: expected_hash.to_string(),
                got: containing.to_string(),
            });
        }

        let raw_header =
            self.raw_object("eth_getBlockByHash", vec![json!(expected_hash), json!(false)]).await?;
        let header: RpcHeader = serde_json::from_value(raw_header)?;

        let raw_receipt =
            self.rpc.request("eth_getTransactionReceipt", vec![json!(rpc_tx.hash)]).await?;
        if raw_receipt.is_null() {
            return Err(ClientError::EmptyReceipt { tx_hash: rpc_tx.hash.to_string() });
        }
        let receipt: RpcReceipt = serde_json::from_value(raw_receipt.clone())?;
        if receipt.block_hash != expected_hash {
            return Err(ClientError::BlockOrphaned {
                expected: expected_hash.to_string(),
                got: receipt.block_hash.to_string(),
            });
        }

        let (trace, raw_trace) = if header.height() != GENESIS_BLOCK_INDEX {
            let raw = self.fetch_transaction_trace(rpc_tx.hash).await?;
            let frame: TraceFrame = serde_json::from_value(raw.clone())?;
            (Some(frame), Some(raw))
        } else {
            (None, None)
        };

        let loaded = self.load_transaction(&header, &rpc_tx, &receipt, raw_receipt, trace, raw_trace)?;
        self.populate_transaction(&loaded)
    }

    /// Proves `account`'s balance at `block` (latest when absent) through a
    /// single atomic GraphQL query.
    pub async fn balance(
        &self,
        account: &AccountIdentifier,
        block: Option<&PartialBlockIdentifier>,
    ) -> Result<AccountBalance, ClientError> {
        let selector = match block {
            Some(PartialBlockIdentifier { hash: Some(hash), .. }) => {
                format!("block(hash: \"{hash}\")")
            }
            Some(PartialBlockIdentifier { index: Some(index), .. }) => {
                format!("block(number: {index})")
            }
            _ => "block".to_owned(),
        };
        let query = format!(
            "{{ {selector} {{ hash number account(address: \"{}\") {{ balance transactionCount code }} }} }}",
            account.address
        );

        let body = self.graphql.query(&query).await?;
        let response: GraphResponse = serde_json::from_str(&body)?;
        if !response.errors.is_empty() {
            let messages: Vec<String> =
                response.errors.into_iter().map(|err| err.message).collect();
            return Err(ClientError::GraphQl(messages.join("; ")));
        }
        let block = response
            .data
            .and_then(|data| data.block)
            .ok_or_else(|| ClientError::GraphQl("response missing block".to_owned()))?;

        let balance = graph_big_quantity(&block.account.balance)?;
        let nonce = graph_u64_quantity(&block.account.transaction_count)?;

        let mut metadata = Map::new();
        metadata.insert("nonce".to_owned(), json!(nonce));
        metadata.insert("code".to_owned(), Value::String(block.account.code));

        Ok(AccountBalance {
            balances: vec![Amount::wei(balance.to_string())],
            block_identifier: BlockIdentifier { index: block.number, hash: block.hash },
            metadata: Some(metadata),
        })
    }

    /// Current network view: tip, genesis, sync progress and peers.
    pub async fn status(&self) -> Result<NetworkStatus, ClientError> {
        let raw =
            self.raw_object("eth_getBlockByNumber", vec![block_num_arg(None), json!(false)]).await?;
        let latest: RpcHeader = serde_json::from_value(raw)?;

        let sync_status = self.sync_progress().await?;
        let peers = if self.skip_admin_calls { Vec::new() } else { self.peers().await? };

        Ok(NetworkStatus {
            current_block_identifier: BlockIdentifier {
                index: latest.height(),
                hash: latest.hash.to_string(),
            },
            current_block_timestamp: latest.timestamp.to::<u64>() as i64 * 1000,
            genesis_block_identifier: self.chain.genesis_block_identifier(),
            sync_status,
            peers,
        })
    }

    /// All transaction hashes currently in the node's pool.
    pub async fn mempool(&self) -> Result<Vec<TransactionIdentifier>, ClientError> {
        let raw = self.rpc.request("txpool_content", vec![]).await?;
        let content: TxPoolContent = serde_json::from_value(raw)?;
        Ok(content
            .hashes()
            .into_iter()
            .map(|hash| TransactionIdentifier { hash: hash.to_string() })
            .collect())
    }

    /// The sender's next nonce, including pool transactions.
    pub async fn pending_nonce(&self, address: Address) -> Result<u64, ClientError> {
        let raw = self
            .rpc
            .request("eth_getTransactionCount", vec![json!(address), json!("pending")])
            .await?;
        let count: String = serde_json::from_value(raw)?;
        parse_quantity_u64(&count)
    }

    /// The node's suggested gas price.
    pub async fn suggest_gas_price(&self) -> Result<U256, ClientError> {
        let raw = self.rpc.request("eth_gasPrice", vec![]).await?;
        Ok(serde_json::from_value(raw)?)
    }

    /// Broadcasts a signed raw transaction.
    pub async fn send_raw_transaction(&self, raw_tx: &[u8]) -> Result<(), ClientError> {
        let encoded = format!("0x{}", hex::encode(raw_tx));
        self.rpc.request("eth_sendRawTransaction", vec![json!(encoded)]).await?;
        Ok(())
    }

    /// Dispatches an allow-listed `/call` request.
    pub async fn call(&self, request: &CallRequest) -> Result<CallResponse, ClientError> {
        let params = CallParams::parse(&request.method, &request.parameters)?;
        let result = match params {
            CallParams::GetBlockByNumber { index, show_transaction_details } => {
                self.raw_object(
                    "eth_getBlockByNumber",
                    vec![block_num_arg(index), json!(show_transaction_details)],
                )
                .await?
            }
            CallParams::GetTransactionReceipt { tx_hash } => {
                self.raw_object("eth_getTransactionReceipt", vec![json!(tx_hash)]).await?
            }
            CallParams::ContractCall { to, data, index, hash } => {
                let block_ref = match (hash, index) {
                    (Some(hash), _) => json!({ "blockHash": hash }),
                    (None, Some(index)) => block_num_arg(Some(index)),
                    (None, None) => block_num_arg(None),
                };
                let response = self
                    .rpc
                    .request("eth_call", vec![json!({ "to": to, "data": data }), block_ref])
                    .await?;
                json!({ "data": response })
            }
            CallParams::EstimateGas { from, to, data } => {
                let response = self
                    .rpc
                    .request(
                        "eth_estimateGas",
                        vec![json!({ "from": from, "to": to, "data": data })],
                    )
                    .await?;
                json!({ "gas": response })
            }
        };
        Ok(CallResponse { result, idempotent: false })
    }

    async fn raw_object(&self, method: &str, params: Vec<Value>) -> Result<Value, ClientError> {
        let raw = self.rpc.request(method, params).await?;
        if raw.is_null() {
            return Err(ClientError::NotFound);
        }
        Ok(raw)
    }

    async fn assemble_block(
        &self,
        header: RpcHeader,
        body: RpcBlockBody,
    ) -> Result<Block, ClientError> {
        check_body_consistency(&header, &body)?;
        debug!(hash = %body.hash, txs = body.transactions.len(), "assembling block");

        let uncles = self.fetch_uncles(&body).await?;
        let receipts = self.fetch_receipts(body.hash, &body.transactions).await?;

        let height = header.height();
        let traces = if height != GENESIS_BLOCK_INDEX && !body.transactions.is_empty() {
            let traces = self.fetch_block_traces(body.hash).await?;
            if traces.len() != body.transactions.len() {
                return Err(ClientError::MalformedTrace(format!(
                    "got {} trace entries for {} transactions",
                    traces.len(),
                    body.transactions.len(),
                )));
            }
            Some(traces)
        } else {
            None
        };

        let block_identifier =
            BlockIdentifier { index: height, hash: body.hash.to_string() };
        let parent_block_identifier = if height == GENESIS_BLOCK_INDEX {
            block_identifier.clone()
        } else {
            BlockIdentifier { index: height - 1, hash: header.parent_hash.to_string() }
        };

        let mut transactions = Vec::with_capacity(body.transactions.len() + 1);
        transactions.push(block_reward_transaction(
            &self.chain,
            &block_identifier,
            &header.miner,
            &uncles,
        ));
        for (i, tx) in body.transactions.iter().enumerate() {
            let (receipt, raw_receipt) = &receipts[i];
            let (trace, raw_trace) = match &traces {
                Some(traces) => {
                    let (frame, raw) = &traces[i];
                    (Some(frame.clone()), Some(raw.clone()))
                }
                None => (None, None),
            };
            let loaded =
                self.load_transaction(&header, tx, receipt, raw_receipt.clone(), trace, raw_trace)?;
            transactions.push(self.populate_transaction(&loaded)?);
        }

        Ok(Block {
            block_identifier,
            parent_block_identifier,
            timestamp: header.timestamp.to::<u64>() as i64 * 1000,
            transactions,
        })
    }

    fn load_transaction(
        &self,
        header: &RpcHeader,
        tx: &RpcTransaction,
        receipt: &RpcReceipt,
        raw_receipt: Value,
        trace: Option<TraceFrame>,
        raw_trace: Option<Value>,
    ) -> Result<LoadedTransaction, ClientError> {
        let sender = tx.from.ok_or(ClientError::MissingSender)?;
        let gas_price = effective_gas_price(tx, header.base_fee_per_gas)?;
        let fee_amount = gas_price * receipt.gas_used;
        let fee_burned = header.base_fee_per_gas.map(|base_fee| base_fee * receipt.gas_used);
        Ok(LoadedTransaction {
            tx: tx.clone(),
            sender,
            gas_price,
            fee_amount,
            fee_burned,
            miner: header.miner,
            raw_receipt,
            trace,
            raw_trace,
        })
    }

    fn populate_transaction(&self, tx: &LoadedTransaction) -> Result<Transaction, ClientError> {
        let mut operations = fee_ops(tx);
        if let Some(trace) = &tx.trace {
            let frames = flatten(trace);
            let trace_ops = self.synthesizer.operations(&frames, operations.len() as i64)?;
            operations.extend(trace_ops);
        }

        let mut metadata = Map::new();
        metadata.insert("gas_limit".to_owned(), json!(format!("0x{:x}", tx.tx.gas.to::<u64>())));
        metadata.insert("gas_price".to_owned(), json!(format!("0x{:x}", tx.gas_price)));
        metadata.insert("receipt".to_owned(), tx.raw_receipt.clone());
        if let Some(raw_trace) = &tx.raw_trace {
            metadata.insert("trace".to_owned(), raw_trace.clone());
        }

        Ok(Transaction {
            transaction_identifier: TransactionIdentifier { hash: tx.tx.hash.to_string() },
            operations,
            metadata: Some(metadata),
        })
    }

    async fn fetch_uncles(&self, body: &RpcBlockBody) -> Result<Vec<RpcHeader>, ClientError> {
        if body.uncles.is_empty() {
            return Ok(Vec::new());
        }
        let calls: Vec<BatchCall> = (0..body.uncles.len())
            .map(|i| {
                BatchCall::new(
                    "eth_getUncleByBlockHashAndIndex",
                    vec![json!(body.hash), json!(format!("0x{i:x}"))],
                )
            })
            .collect();
        let results = self.rpc.batch(&calls).await?;

        let mut uncles = Vec::with_capacity(results.len());
        for (index, raw) in results.into_iter().enumerate() {
            if raw.is_null() {
                return Err(ClientError::EmptyUncle { index });
            }
            uncles.push(serde_json::from_value(raw)?);
        }
        Ok(uncles)
    }

    async fn fetch_receipts(
        &self,
        block_hash: B256,
        txs: &[RpcTransaction],
    ) -> Result<Vec<(RpcReceipt, Value)>, ClientError> {
        if txs.is_empty() {
            return Ok(Vec::new());
        }
        let calls: Vec<BatchCall> = txs
            .iter()
            .map(|tx| BatchCall::new("eth_getTransactionReceipt", vec![json!(tx.hash)]))
            .collect();
        let results = self.rpc.batch(&calls).await?;

        let mut receipts = Vec::with_capacity(results.len());
        for (tx, raw) in txs.iter().zip(results) {
            if raw.is_null() {
                return Err(ClientError::EmptyReceipt { tx_hash: tx.hash.to_string() });
            }
            let receipt: RpcReceipt = serde_json::from_value(raw.clone())?;
            if receipt.block_hash != block_hash {
                warn!(expected = %block_hash, got = %receipt.block_hash, "receipt points at another block");
                return Err(ClientError::BlockOrphaned {
                    expected: block_hash.to_string(),
                    got: receipt.block_hash.to_string(),
                });
            }
            receipts.push((receipt, raw));
        }
        Ok(receipts)
    }

    async fn fetch_block_traces(
        &self,
        block_hash: B256,
    ) -> Result<Vec<(TraceFrame, Value)>, ClientError> {
        let _permit = self
            .trace_guard
            .acquire()
            .await
            .map_err(|_| ClientError::Transport(TransportError::Canceled))?;
        let raw = self
            .rpc
            .request("debug_traceBlockByHash", vec![json!(block_hash), self.trace_config.clone()])
            .await?;

        let entries: Vec<Value> = serde_json::from_value(raw)?;
        let mut traces = Vec::with_capacity(entries.len());
        for entry in entries {
            let result = entry
                .get("result")
                .cloned()
                .ok_or_else(|| ClientError::MalformedTrace("trace entry missing result".to_owned()))?;
            let frame: TraceFrame = serde_json::from_value(result.clone())?;
            traces.push((frame, result));
        }
        Ok(traces)
    }

    async fn fetch_transaction_trace(&self, tx_hash: B256) -> Result<Value, ClientError> {
        let _permit = self
            .trace_guard
            .acquire()
            .await
            .map_err(|_| ClientError::Transport(TransportError::Canceled))?;
        Ok(self
            .rpc
            .request("debug_traceTransaction", vec![json!(tx_hash), self.trace_config.clone()])
            .await?)
    }

    async fn sync_progress(&self) -> Result<Option<SyncStatus>, ClientError> {
        let raw = self.rpc.request("eth_syncing", vec![]).await?;
        if raw == Value::Bool(false) {
            return Ok(None);
        }
        let progress: RpcSyncProgress = serde_json::from_value(raw)?;
        Ok(Some(SyncStatus {
            current_index: Some(progress.current_block.to::<u64>() as i64),
            target_index: Some(progress.highest_block.to::<u64>() as i64),
        }))
    }

    async fn peers(&self) -> Result<Vec<Peer>, ClientError> {
        let raw = self.rpc.request("admin_peers", vec![]).await?;
        let infos: Vec<RpcPeerInfo> = serde_json::from_value(raw)?;
        Ok(infos
            .into_iter()
            .map(|info| {
                let mut metadata = Map::new();
                metadata.insert("name".to_owned(), Value::String(info.name));
                metadata.insert("enode".to_owned(), Value::String(info.enode));
                metadata.insert("caps".to_owned(), json!(info.caps));
                if let Some(enr) = info.enr {
                    metadata.insert("enr".to_owned(), Value::String(enr));
                }
                metadata.insert("protocols".to_owned(), info.protocols);
                Peer { peer_id: info.id, metadata: Some(metadata) }
            })
            .collect())
    }
}

fn check_body_consistency(header: &RpcHeader, body: &RpcBlockBody) -> Result<(), ClientError> {
    if header.hash != body.hash {
        return Err(ClientError::InconsistentBody("header and body hash mismatch".to_owned()));
    }
    if (header.sha3_uncles == EMPTY_UNCLE_HASH) != body.uncles.is_empty() {
        return Err(ClientError::InconsistentBody(
            "uncle list does not match sha3Uncles".to_owned(),
        ));
    }
    if (header.transactions_root == EMPTY_ROOT) != body.transactions.is_empty() {
        return Err(ClientError::InconsistentBody(
            "transaction list does not match transactionsRoot".to_owned(),
        ));
    }
    Ok(())
}

fn block_num_arg(number: Option<i64>) -> Value {
    match number {
        None => json!("latest"),
        Some(number) => json!(format!("0x{number:x}")),
    }
}

fn parse_quantity_u64(value: &str) -> Result<u64, ClientError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    u64::from_str_radix(digits, 16)
        .map_err(|err| ClientError::InvalidInput(format!("bad quantity `{value}`: {err}")))
}

fn graph_big_quantity(value: &Value) -> Result<U256, ClientError> {
    match value {
        Value::String(s) => {
            let result = match s.strip_prefix("0x") {
                Some(digits) => U256::from_str_radix(digits, 16),
                None => U256::from_str_radix(s, 10),
            };
            result.map_err(|err| ClientError::GraphQl(format!("bad quantity `{s}`: {err}")))
        }
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| ClientError::GraphQl(format!("bad quantity `{n}`"))),
        other => Err(ClientError::GraphQl(format!("bad quantity `{other}`"))),
    }
}

fn graph_u64_quantity(value: &Value) -> Result<u64, ClientError> {
    match value {
        Value::String(s) => parse_quantity_u64(s)
            .map_err(|_| ClientError::GraphQl(format!("bad quantity `{s}`"))),
        Value::Number(n) => {
            n.as_u64().ok_or_else(|| ClientError::GraphQl(format!("bad quantity `{n}`")))
        }
        other => Err(ClientError::GraphQl(format!("bad quantity `{other}`"))),
    }
}

#[derive(serde::Deserialize)]
struct GraphResponse {
    #[serde(default)]
    errors: Vec<GraphError>,
    #[serde(default)]
    data: Option<GraphData>,
}

#[derive(serde::Deserialize)]
struct GraphError {
    message: String,
}

#[derive(serde::Deserialize)]
struct GraphData {
    block: Option<GraphBlock>,
}

#[derive(serde::Deserialize)]
struct GraphBlock {
    hash: String,
    number: i64,
    account: GraphAccount,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphAccount {
    balance: Value,
    transaction_count: Value,
    code: String,
}
