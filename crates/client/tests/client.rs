//! End-to-end assembly tests against scripted transports.

use async_trait::async_trait;
use rosetta_geth_client::{
    BatchCall, ClientError, EthClient, GraphQl, JsonRpc, TransportError,
};
use rosetta_geth_types::{
    mainnet, AccountIdentifier, BlockIdentifier, OpStatus, PartialBlockIdentifier,
    TransactionIdentifier,
};
use serde_json::{json, Value};
use std::collections::HashMap;

const BLOCK_HASH: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const PARENT_HASH: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
const TX_HASH: &str = "0xdddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddd";
const EMPTY_UNCLES: &str = "0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347";
const EMPTY_ROOT: &str = "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421";
const TX_ROOT: &str = "0xcccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccc";
const SENDER: &str = "0x0000000000000000000000000000000000000001";
const RECIPIENT: &str = "0x0000000000000000000000000000000000000002";
const MINER: &str = "0x00000000000000000000000000000000000000fe";

/// Canned responses keyed by method name.
struct ScriptedRpc {
    routes: HashMap<&'static str, Value>,
}

impl ScriptedRpc {
    fn new(routes: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
        Self { routes: routes.into_iter().collect() }
    }
}

#[async_trait]
impl JsonRpc for ScriptedRpc {
    async fn request(&self, method: &str, _params: Vec<Value>) -> Result<Value, TransportError> {
        self.routes.get(method).cloned().ok_or_else(|| TransportError::Rpc {
            method: method.to_owned(),
            message: "unexpected method".to_owned(),
        })
    }

    async fn batch(&self, calls: &[BatchCall]) -> Result<Vec<Value>, TransportError> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            results.push(self.request(call.method, call.params.clone()).await?);
        }
        Ok(results)
    }
}

/// GraphQL stub returning one canned body.
struct ScriptedGraphQl(Value);

#[async_trait]
impl GraphQl for ScriptedGraphQl {
    async fn query(&self, _query: &str) -> Result<String, TransportError> {
        Ok(self.0.to_string())
    }
}

fn no_graphql() -> ScriptedGraphQl {
    ScriptedGraphQl(json!({ "errors": [{ "message": "not wired" }] }))
}

fn block_payload() -> Value {
    json!({
        "hash": BLOCK_HASH,
        "parentHash": PARENT_HASH,
        "sha3Uncles": EMPTY_UNCLES,
        "transactionsRoot": TX_ROOT,
        "miner": MINER,
        "number": "0x2",
        "timestamp": "0x64",
        "uncles": [],
        "transactions": [{
            "hash": TX_HASH,
            "nonce": "0x0",
            "gas": "0x5208",
            "gasPrice": "0x2710",
            "from": SENDER,
            "to": RECIPIENT,
            "value": "0x32",
            "input": "0x",
        }],
    })
}

fn receipt_payload(block_hash: &str) -> Value {
    json!({
        "transactionHash": TX_HASH,
        "blockHash": block_hash,
        "blockNumber": "0x2",
        "gasUsed": "0x5208",
        "status": "0x1",
    })
}

fn trace_payload() -> Value {
    json!([{
        "result": {
            "type": "CALL",
            "from": SENDER,
            "to": RECIPIENT,
            "value": "0x32",
            "gasUsed": "0x5208",
            "input": "0x",
        },
    }])
}

#[tokio::test]
async fn assembles_a_block_with_reward_fee_and_transfer() {
    let rpc = ScriptedRpc::new([
        ("eth_getBlockByNumber", block_payload()),
        ("eth_getTransactionReceipt", receipt_payload(BLOCK_HASH)),
        ("debug_traceBlockByHash", trace_payload()),
    ]);
    let client = EthClient::new(rpc, no_graphql(), mainnet());

    let block =
        client.block(Some(&PartialBlockIdentifier::from_index(2))).await.unwrap();

    assert_eq!(block.block_identifier, BlockIdentifier { index: 2, hash: BLOCK_HASH.to_owned() });
    assert_eq!(
        block.parent_block_identifier,
        BlockIdentifier { index: 1, hash: PARENT_HASH.to_owned() }
    );
    assert_eq!(block.timestamp, 100_000);
    assert_eq!(block.transactions.len(), 2);

    // reward pseudo-transaction is first and reuses the block hash
    let reward = &block.transactions[0];
    assert_eq!(reward.transaction_identifier.hash, BLOCK_HASH);
    assert_eq!(reward.operations.len(), 1);
    assert_eq!(reward.operations[0].op_type, "MINER_REWARD");
    assert_eq!(reward.operations[0].amount.as_ref().unwrap().value, "5000000000000000000");

    // then the transfer: fee pair, then the CALL pair
    let transfer = &block.transactions[1];
    assert_eq!(transfer.transaction_identifier.hash, TX_HASH);
    let ops = &transfer.operations;
    assert_eq!(ops.len(), 4);
    let indices: Vec<i64> = ops.iter().map(|op| op.operation_identifier.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);

    // 21000 gas at 10000 wei
    assert_eq!(ops[0].op_type, "FEE");
    assert_eq!(ops[0].amount.as_ref().unwrap().value, "-210000000");
    assert_eq!(ops[1].amount.as_ref().unwrap().value, "210000000");

    assert_eq!(ops[2].op_type, "CALL");
    assert_eq!(ops[2].amount.as_ref().unwrap().value, "-50");
    assert_eq!(ops[3].amount.as_ref().unwrap().value, "50");
    assert!(ops.iter().all(|op| op.status == Some(OpStatus::Success)));

    // metadata carries the raw receipt and trace
    let metadata = transfer.metadata.as_ref().unwrap();
    assert_eq!(metadata["gas_limit"], "0x5208");
    assert_eq!(metadata["gas_price"], "0x2710");
    assert_eq!(metadata["receipt"]["blockHash"], BLOCK_HASH);
    assert_eq!(metadata["trace"]["type"], "CALL");
}

#[tokio::test]
async fn receipt_from_another_block_is_an_orphan() {
    let other = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";
    let rpc = ScriptedRpc::new([
        ("eth_getBlockByNumber", block_payload()),
        ("eth_getTransactionReceipt", receipt_payload(other)),
    ]);
    let client = EthClient::new(rpc, no_graphql(), mainnet());

    let err = client.block(Some(&PartialBlockIdentifier::from_index(2))).await.unwrap_err();
    assert!(matches!(err, ClientError::BlockOrphaned { .. }));
}

#[tokio::test]
async fn genesis_block_skips_traces_and_parents_itself() {
    let genesis = json!({
        "hash": BLOCK_HASH,
        "parentHash": "0x0000000000000000000000000000000000000000000000000000000000000000",
        "sha3Uncles": EMPTY_UNCLES,
        "transactionsRoot": EMPTY_ROOT,
        "miner": MINER,
        "number": "0x0",
        "timestamp": "0x0",
        "uncles": [],
        "transactions": [],
    });
    // no trace or receipt routes: asking for either would fail the test
    let rpc = ScriptedRpc::new([("eth_getBlockByNumber", genesis)]);
    let client = EthClient::new(rpc, no_graphql(), mainnet());

    let block = client.block(Some(&PartialBlockIdentifier::from_index(0))).await.unwrap();
    assert_eq!(block.block_identifier, block.parent_block_identifier);
    assert_eq!(block.transactions.len(), 1);
    assert_eq!(block.transactions[0].operations[0].amount.as_ref().unwrap().value, "0");
}

#[tokio::test]
async fn body_contradicting_its_header_is_rejected() {
    let mut payload = block_payload();
    payload["sha3Uncles"] = json!(TX_ROOT); // claims uncles, body lists none
    let rpc = ScriptedRpc::new([("eth_getBlockByNumber", payload)]);
    let client = EthClient::new(rpc, no_graphql(), mainnet());

    let err = client.block(None).await.unwrap_err();
    assert!(matches!(err, ClientError::InconsistentBody(_)));
}

#[tokio::test]
async fn block_transaction_detects_orphaned_transactions() {
    let moved = json!({
        "hash": TX_HASH,
        "nonce": "0x0",
        "gas": "0x5208",
        "gasPrice": "0x2710",
        "from": SENDER,
        "to": RECIPIENT,
        "value": "0x32",
        "input": "0x",
        "blockHash": PARENT_HASH,
        "blockNumber": "0x1",
    });
    let rpc = ScriptedRpc::new([("eth_getTransactionByHash", moved)]);
    let client = EthClient::new(rpc, no_graphql(), mainnet());

    let err = client
        .block_transaction(
            &BlockIdentifier { index: 2, hash: BLOCK_HASH.to_owned() },
            &TransactionIdentifier { hash: TX_HASH.to_owned() },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::BlockOrphaned { .. }));
}

#[tokio::test]
async fn balance_returns_the_proven_block_and_metadata() {
    let graphql = ScriptedGraphQl(json!({
        "data": {
            "block": {
                "hash": BLOCK_HASH,
                "number": 2,
                "account": {
                    "balance": "0xde0b6b3a7640000",
                    "transactionCount": "0x7",
                    "code": "0x",
                },
            },
        },
    }));
    let rpc = ScriptedRpc::new([]);
    let client = EthClient::new(rpc, graphql, mainnet());

    let balance = client
        .balance(
            &AccountIdentifier { address: SENDER.to_owned() },
            Some(&PartialBlockIdentifier::from_hash(BLOCK_HASH)),
        )
        .await
        .unwrap();

    assert_eq!(balance.block_identifier, BlockIdentifier { index: 2, hash: BLOCK_HASH.to_owned() });
    assert_eq!(balance.balances.len(), 1);
    assert_eq!(balance.balances[0].value, "1000000000000000000");
    assert_eq!(balance.balances[0].currency.symbol, "ETH");

    let metadata = balance.metadata.unwrap();
    assert_eq!(metadata["nonce"], 7);
    assert_eq!(metadata["code"], "0x");
}

#[tokio::test]
async fn balance_surfaces_graphql_errors() {
    let client = EthClient::new(ScriptedRpc::new([]), no_graphql(), mainnet());
    let err = client
        .balance(&AccountIdentifier { address: SENDER.to_owned() }, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::GraphQl(_)));
}

#[tokio::test]
async fn mempool_lists_pending_and_queued_hashes() {
    let rpc = ScriptedRpc::new([(
        "txpool_content",
        json!({
            "pending": { SENDER: { "0": { "hash": TX_HASH } } },
            "queued": {},
        }),
    )]);
    let client = EthClient::new(rpc, no_graphql(), mainnet());

    let hashes = client.mempool().await.unwrap();
    assert_eq!(hashes, vec![TransactionIdentifier { hash: TX_HASH.to_owned() }]);
}

#[tokio::test]
async fn status_reports_tip_genesis_and_sync_progress() {
    let header = json!({
        "hash": BLOCK_HASH,
        "parentHash": PARENT_HASH,
        "sha3Uncles": EMPTY_UNCLES,
        "transactionsRoot": EMPTY_ROOT,
        "miner": MINER,
        "number": "0x2",
        "timestamp": "0x64",
    });
    let rpc = ScriptedRpc::new([
        ("eth_getBlockByNumber", header),
        ("eth_syncing", json!({
            "startingBlock": "0x0",
            "currentBlock": "0x2",
            "highestBlock": "0xa",
        })),
        ("admin_peers", json!([{ "id": "peer-1", "name": "geth/v1.10", "enode": "enode://x" }])),
    ]);
    let client = EthClient::new(rpc, no_graphql(), mainnet());

    let status = client.status().await.unwrap();
    assert_eq!(status.current_block_identifier.index, 2);
    assert_eq!(status.current_block_timestamp, 100_000);
    assert_eq!(status.genesis_block_identifier, mainnet().genesis_block_identifier());
    let sync = status.sync_status.unwrap();
    assert_eq!(sync.current_index, Some(2));
    assert_eq!(sync.target_index, Some(10));
    assert_eq!(status.peers.len(), 1);
    assert_eq!(status.peers[0].peer_id, "peer-1");
}

#[tokio::test]
async fn call_rejects_unlisted_methods_before_dispatch() {
    let client = EthClient::new(ScriptedRpc::new([]), no_graphql(), mainnet());
    let request = rosetta_geth_types::CallRequest {
        method: "eth_sendRawTransaction".to_owned(),
        parameters: Default::default(),
    };
    let err = client.call(&request).await.unwrap_err();
    assert!(matches!(err, ClientError::CallMethodInvalid(_)));
}

#[tokio::test]
async fn call_passes_through_receipts() {
    let rpc = ScriptedRpc::new([("eth_getTransactionReceipt", receipt_payload(BLOCK_HASH))]);
    let client = EthClient::new(rpc, no_graphql(), mainnet());
    let request = rosetta_geth_types::CallRequest {
        method: "eth_getTransactionReceipt".to_owned(),
        parameters: json!({ "tx_hash": TX_HASH }).as_object().unwrap().clone(),
    };
    let response = client.call(&request).await.unwrap();
    assert!(!response.idempotent);
    assert_eq!(response.result["transactionHash"], TX_HASH);
}
