//! The `/call` passthrough surface.
//!
//! Only an allow list of node methods is exposed, and each method's
//! parameters are validated against a schema before anything is dispatched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Methods the passthrough accepts.
pub const CALL_METHODS: [&str; 4] =
    ["eth_getBlockByNumber", "eth_getTransactionReceipt", "eth_call", "eth_estimateGas"];

/// A `/call` request: method name plus loosely typed parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
    /// Node method to invoke.
    pub method: String,
    /// Method parameters, validated against the method's schema.
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// A `/call` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResponse {
    /// Raw node result.
    pub result: Value,
    /// Whether repeating the call is guaranteed to return the same result.
    pub idempotent: bool,
}

/// Why a `/call` request was rejected before dispatch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallParseError {
    /// The method is not in [`CALL_METHODS`].
    #[error("call method `{0}` is not supported")]
    MethodInvalid(String),
    /// The parameters do not fit the method's schema.
    #[error("{0}")]
    Parameters(String),
}

#[derive(Debug, Deserialize)]
struct GetBlockByNumberInput {
    index: Option<i64>,
    #[serde(default)]
    show_transaction_details: bool,
}

#[derive(Debug, Deserialize)]
struct GetTransactionReceiptInput {
    tx_hash: String,
}

#[derive(Debug, Deserialize)]
struct ContractCallInput {
    to: String,
    data: String,
    index: Option<i64>,
    hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EstimateGasInput {
    from: String,
    to: String,
    data: String,
}

/// Validated parameters of one allow-listed `/call` method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallParams {
    /// `eth_getBlockByNumber`; `index` absent means latest.
    GetBlockByNumber {
        /// Block height to fetch.
        index: Option<i64>,
        /// Whether to return full transaction objects.
        show_transaction_details: bool,
    },
    /// `eth_getTransactionReceipt` for one transaction hash.
    GetTransactionReceipt {
        /// Transaction hash.
        tx_hash: String,
    },
    /// `eth_call` against a contract at a block reference.
    ContractCall {
        /// Contract address.
        to: String,
        /// Call data, `0x`-prefixed hex.
        data: String,
        /// Block height to execute at.
        index: Option<i64>,
        /// Block hash to execute at. Wins over `index`.
        hash: Option<String>,
    },
    /// `eth_estimateGas` for a prospective call.
    EstimateGas {
        /// Caller address.
        from: String,
        /// Contract address.
        to: String,
        /// Call data, `0x`-prefixed hex.
        data: String,
    },
}

impl CallParams {
    /// Validates `parameters` against `method`'s schema.
    pub fn parse(method: &str, parameters: &Map<String, Value>) -> Result<Self, CallParseError> {
        let raw = Value::Object(parameters.clone());
        match method {
            "eth_getBlockByNumber" => {
                let input: GetBlockByNumberInput = decode(raw)?;
                Ok(CallParams::GetBlockByNumber {
                    index: input.index,
                    show_transaction_details: input.show_transaction_details,
                })
            }
            "eth_getTransactionReceipt" => {
                let input: GetTransactionReceiptInput = decode(raw)?;
                require(!input.tx_hash.is_empty(), "tx_hash missing from params")?;
                Ok(CallParams::GetTransactionReceipt { tx_hash: input.tx_hash })
            }
            "eth_call" => {
                let input: ContractCallInput = decode(raw)?;
                require(!input.to.is_empty(), "to address missing from params")?;
                require(!input.data.is_empty(), "data missing from params")?;
                Ok(CallParams::ContractCall {
                    to: input.to,
                    data: input.data,
                    index: input.index,
                    hash: input.hash,
                })
            }
            "eth_estimateGas" => {
                let input: EstimateGasInput = decode(raw)?;
                require(!input.from.is_empty(), "from address missing from params")?;
                require(!input.to.is_empty(), "to address missing from params")?;
                require(!input.data.is_empty(), "data missing from params")?;
                Ok(CallParams::EstimateGas { from: input.from, to: input.to, data: input.data })
            }
            other => Err(CallParseError::MethodInvalid(other.to_owned())),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(raw: Value) -> Result<T, CallParseError> {
    serde_json::from_value(raw).map_err(|err| CallParseError::Parameters(err.to_string()))
}

fn require(ok: bool, message: &str) -> Result<(), CallParseError> {
    if ok {
        Ok(())
    } else {
        Err(CallParseError::Parameters(message.to_owned()))
    }
}
