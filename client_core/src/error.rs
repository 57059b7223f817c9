//! Top-level error taxonomy surfaced by [`crate::client::Client`]. Wraps
//! the per-subsystem errors ([`crate::engine::EngineError`],
//! [`crate::crypto::CryptoError`], [`crate::relayer::RelayerError`], …) and
//! adds the permission/validation/lifecycle codes the generic Engine
//! deliberately does not own, since they depend on per-kind permission
//! tables only the Client facade knows.

use crate::{
    crypto::CryptoError, engine::EngineError, history::HistoryError, pairing_uri::ParseError,
    relayer::RelayerError, rpc::ParamsError, subscription::StoreError,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Relayer(#[from] RelayerError),

    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    PairingUri(#[from] ParseError),

    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("NO_MATCHING_RESPONSE: no response arrived for request id={0} before its timeout")]
    NoMatchingResponse(u64),

    #[error("UNAUTHORIZED_JSON_RPC_METHOD: method {0:?} is not in this sequence's permissions")]
    UnauthorizedJsonRpcMethod(String),

    #[error("UNAUTHORIZED_NOTIFICATION_TYPE: notification type {0:?} is not in this sequence's permissions")]
    UnauthorizedNotificationType(String),

    #[error("UNAUTHORIZED_TARGET_CHAIN: chain {0:?} is not in this session's negotiated namespaces")]
    UnauthorizedTargetChain(String),

    #[error("MISSING_OR_INVALID: {0}")]
    MissingOrInvalid(&'static str),

    #[error("peer rejected: {0}")]
    Rejected(String),
}
