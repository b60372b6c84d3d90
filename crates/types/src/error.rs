//! The stable error catalog.
//!
//! Codes and retriability are part of the wire contract: clients key retry
//! behavior off them, so variants are append-only.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Every error the gateway can return, by stable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// 0: the endpoint is not implemented.
    #[error("endpoint not implemented")]
    Unimplemented,
    /// 1: the endpoint needs the node and the gateway is offline.
    #[error("endpoint unavailable offline")]
    UnavailableOffline,
    /// 2: a node request failed.
    #[error("node request failed")]
    NodeError,
    /// 3: the supplied public key could not be decompressed.
    #[error("unable to decompress public key")]
    InvalidPublicKey,
    /// 4: the supplied operations do not describe a recognized intent.
    #[error("unable to parse intent")]
    UnclearIntent,
    /// 5: an intermediate construction artifact failed to parse.
    #[error("unable to parse intermediate result")]
    InvalidIntermediate,
    /// 6: the supplied signature is malformed.
    #[error("signature invalid")]
    InvalidSignature,
    /// 7: the node rejected the broadcast.
    #[error("unable to broadcast transaction")]
    BroadcastFailed,
    /// 8: `/call` parameters do not fit the method's schema.
    #[error("call parameters invalid")]
    CallParametersInvalid,
    /// 9: a `/call` result could not be marshaled.
    #[error("call output marshal failed")]
    CallOutputMarshal,
    /// 10: the `/call` method is not in the allow list.
    #[error("call method invalid")]
    CallMethodInvalid,
    /// 11: the fetched block was orphaned mid-request. Retriable.
    #[error("block orphaned")]
    BlockOrphaned,
    /// 12: the supplied address does not parse.
    #[error("invalid address")]
    InvalidAddress,
    /// 13: the node is not ready to serve. Retriable.
    #[error("node not ready")]
    NodeNotReady,
}

impl ApiError {
    /// All catalog entries, in code order.
    pub const ALL: [ApiError; 14] = [
        ApiError::Unimplemented,
        ApiError::UnavailableOffline,
        ApiError::NodeError,
        ApiError::InvalidPublicKey,
        ApiError::UnclearIntent,
        ApiError::InvalidIntermediate,
        ApiError::InvalidSignature,
        ApiError::BroadcastFailed,
        ApiError::CallParametersInvalid,
        ApiError::CallOutputMarshal,
        ApiError::CallMethodInvalid,
        ApiError::BlockOrphaned,
        ApiError::InvalidAddress,
        ApiError::NodeNotReady,
    ];

    /// Stable numeric code.
    pub const fn code(&self) -> u32 {
        match self {
            ApiError::Unimplemented => 0,
            ApiError::UnavailableOffline => 1,
            ApiError::NodeError => 2,
            ApiError::InvalidPublicKey => 3,
            ApiError::UnclearIntent => 4,
            ApiError::InvalidIntermediate => 5,
            ApiError::InvalidSignature => 6,
            ApiError::BroadcastFailed => 7,
            ApiError::CallParametersInvalid => 8,
            ApiError::CallOutputMarshal => 9,
            ApiError::CallMethodInvalid => 10,
            ApiError::BlockOrphaned => 11,
            ApiError::InvalidAddress => 12,
            ApiError::NodeNotReady => 13,
        }
    }

    /// Whether the caller may retry the identical request.
    pub const fn retriable(&self) -> bool {
        matches!(self, ApiError::BlockOrphaned | ApiError::NodeNotReady)
    }

    /// Wire form without extra context.
    pub fn detail(&self) -> ErrorDetail {
        ErrorDetail {
            code: self.code(),
            message: self.to_string(),
            retriable: self.retriable(),
            details: None,
        }
    }

    /// Wire form carrying a `context` string in `details`.
    pub fn with_context(self, context: impl Into<String>) -> ErrorDetail {
        let mut details = Map::new();
        details.insert("context".to_owned(), Value::String(context.into()));
        ErrorDetail { details: Some(details), ..self.detail() }
    }

    /// The full catalog in wire form, for the options surface.
    pub fn catalog() -> Vec<ErrorDetail> {
        Self::ALL.iter().map(ApiError::detail).collect()
    }
}

/// Wire form of a catalog error, optionally with request context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable numeric code.
    pub code: u32,
    /// Stable message for the code.
    pub message: String,
    /// Whether the caller may retry the identical request.
    pub retriable: bool,
    /// Request-specific context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_dense_and_ordered() {
        for (i, err) in ApiError::ALL.iter().enumerate() {
            assert_eq!(err.code(), i as u32);
        }
    }

    #[test]
    fn only_orphaned_and_not_ready_are_retriable() {
        let retriable: Vec<_> =
            ApiError::ALL.iter().filter(|e| e.retriable()).map(|e| e.code()).collect();
        assert_eq!(retriable, vec![11, 13]);
    }

    #[test]
    fn context_lands_in_details() {
        let detail = ApiError::BlockOrphaned.with_context("hash mismatch");
        assert_eq!(detail.code, 11);
        assert!(detail.retriable);
        assert_eq!(detail.details.unwrap()["context"], "hash mismatch");
    }

    #[test]
    fn catalog_covers_every_variant() {
        assert_eq!(ApiError::catalog().len(), ApiError::ALL.len());
    }
}
