//! Construction failures and their mapping onto the wire error catalog.

use rosetta_geth_client::ClientError;
use rosetta_geth_types::{ApiError, ErrorDetail};

/// Any failure of the construction pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ConstructionError {
    /// The supplied public key bytes are not a curve point.
    #[error("unable to decompress public key: {0}")]
    InvalidPublicKey(secp256k1::Error),
    /// The supplied operations do not describe a single transfer.
    #[error("unable to parse intent: {0}")]
    UnclearIntent(String),
    /// An address failed to parse.
    #[error("invalid address `{0}`")]
    InvalidAddress(String),
    /// An intermediate artifact failed to parse.
    #[error("unable to parse intermediate result: {0}")]
    InvalidIntermediate(String),
    /// The signature is malformed or does not verify.
    #[error("signature invalid: {0}")]
    InvalidSignature(String),
    /// The node rejected the broadcast.
    #[error("unable to broadcast transaction: {0}")]
    Broadcast(String),
    /// The step needs the node and the gateway is offline.
    #[error("endpoint unavailable offline")]
    UnavailableOffline,
    /// A node request failed.
    #[error(transparent)]
    Backend(#[from] ClientError),
}

impl ConstructionError {
    /// The catalog entry this failure maps onto.
    pub fn api_error(&self) -> ApiError {
        match self {
            ConstructionError::InvalidPublicKey(_) => ApiError::InvalidPublicKey,
            ConstructionError::UnclearIntent(_) => ApiError::UnclearIntent,
            ConstructionError::InvalidAddress(_) => ApiError::InvalidAddress,
            ConstructionError::InvalidIntermediate(_) => ApiError::InvalidIntermediate,
            ConstructionError::InvalidSignature(_) => ApiError::InvalidSignature,
            ConstructionError::Broadcast(_) => ApiError::BroadcastFailed,
            ConstructionError::UnavailableOffline => ApiError::UnavailableOffline,
            ConstructionError::Backend(inner) => inner.api_error(),
        }
    }
}

impl From<ConstructionError> for ErrorDetail {
    fn from(err: ConstructionError) -> Self {
        err.api_error().with_context(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_maps_to_code_one_without_context_loss() {
        let detail = ErrorDetail::from(ConstructionError::UnavailableOffline);
        assert_eq!(detail.code, 1);
        assert!(!detail.retriable);
    }

    #[test]
    fn backend_failures_keep_the_client_mapping() {
        let err = ConstructionError::Backend(ClientError::NotFound);
        assert_eq!(err.api_error(), ApiError::NodeError);
    }
}
