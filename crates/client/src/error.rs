//! Client-side failures and their mapping onto the wire error catalog.

use crate::transport::TransportError;
use rosetta_geth_types::{ApiError, CallParseError, ErrorDetail};

/// Any failure of the fetch or translation layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A node response did not decode into the expected shape.
    #[error("response decode failed: {0}")]
    Decode(#[from] serde_json::Error),
    /// The requested object does not exist on the node.
    #[error("not found")]
    NotFound,
    /// The fetched block was orphaned while its pieces were being collected.
    #[error("block orphaned: expected receipts for {expected}, got {got}")]
    BlockOrphaned {
        /// Hash of the block the receipts were requested for.
        expected: String,
        /// Hash the receipt actually points at.
        got: String,
    },
    /// The block body contradicts its own header.
    #[error("inconsistent block body: {0}")]
    InconsistentBody(String),
    /// The node returned a null receipt inside a confirmed block.
    #[error("got null receipt for transaction {tx_hash}")]
    EmptyReceipt {
        /// Hash of the transaction missing its receipt.
        tx_hash: String,
    },
    /// The node returned a null header for a listed uncle.
    #[error("got null header for uncle {index}")]
    EmptyUncle {
        /// Position of the uncle within the block.
        index: usize,
    },
    /// The node returned a trace list that does not line up with the block.
    #[error("block trace is missing entries: {0}")]
    MalformedTrace(String),
    /// A transaction inside a block carries no sender.
    #[error("transaction missing sender")]
    MissingSender,
    /// The fee of a transaction cannot be computed.
    #[error("invalid fee calculation: {0}")]
    FeeCalculation(&'static str),
    /// A traced value does not fit signed arithmetic.
    #[error("trace value out of range: {context}")]
    ValueOverflow {
        /// The offending value.
        context: String,
    },
    /// A destroyed account ended the transaction owing value.
    #[error("negative balance {balance} for destroyed account {address}")]
    NegativeDestroyedBalance {
        /// The destroyed account.
        address: String,
        /// Its leftover balance.
        balance: String,
    },
    /// The GraphQL balance query failed.
    #[error("graphql query failed: {0}")]
    GraphQl(String),
    /// A user-supplied identifier did not parse.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The `/call` method is not allow-listed.
    #[error("call method `{0}` is not supported")]
    CallMethodInvalid(String),
    /// The `/call` parameters do not fit the method's schema.
    #[error("call parameters invalid: {0}")]
    CallParametersInvalid(String),
}

impl From<CallParseError> for ClientError {
    fn from(err: CallParseError) -> Self {
        match err {
            CallParseError::MethodInvalid(method) => ClientError::CallMethodInvalid(method),
            CallParseError::Parameters(message) => ClientError::CallParametersInvalid(message),
        }
    }
}

impl ClientError {
    /// The catalog entry this failure maps onto.
    pub fn api_error(&self) -> ApiError {
        match self {
            ClientError::BlockOrphaned { .. } => ApiError::BlockOrphaned,
            ClientError::CallMethodInvalid(_) => ApiError::CallMethodInvalid,
            ClientError::CallParametersInvalid(_) => ApiError::CallParametersInvalid,
            ClientError::InvalidInput(_) => ApiError::InvalidAddress,
            _ => ApiError::NodeError,
        }
    }
}

impl From<ClientError> for ErrorDetail {
    fn from(err: ClientError) -> Self {
        err.api_error().with_context(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orphaned_blocks_map_to_a_retriable_wire_error() {
        let err = ClientError::BlockOrphaned { expected: "0xaa".into(), got: "0xbb".into() };
        let detail = ErrorDetail::from(err);
        assert_eq!(detail.code, 11);
        assert!(detail.retriable);
        assert!(detail.details.unwrap()["context"].as_str().unwrap().contains("0xaa"));
    }

    #[test]
    fn transport_failures_map_to_node_error() {
        let err = ClientError::Transport(TransportError::Canceled);
        let detail = ErrorDetail::from(err);
        assert_eq!(detail.code, 2);
        assert!(!detail.retriable);
    }
}
