//! Error types for the client library.

use thiserror::Error;

use crate::transaction::{Response, TransactionState};

/// Client error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The RPC layer reported a failure (network error or server-side error).
    #[error("rpc failed: {0}")]
    Transport(tonic::Status),

    /// Login was rejected or could not be completed.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(tonic::Status),

    /// Connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Operation attempted on a transaction that is no longer in the OK state.
    #[error("transaction is not OK (state: {0})")]
    TransactionNotOk(TransactionState),

    /// Server returned a context whose start timestamp disagrees with ours.
    #[error("start timestamp mismatch: transaction has {local}, server sent {incoming}")]
    StartTsMismatch {
        /// Start timestamp held by the transaction.
        local: u64,
        /// Start timestamp carried by the server response.
        incoming: u64,
    },

    /// The client was closed.
    #[error("client already closed")]
    AlreadyDisposed,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Call metadata could not be encoded as gRPC headers.
    #[error("invalid call metadata: {0}")]
    InvalidMetadata(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// The RPC succeeded but a later step failed.
    ///
    /// The server's response is kept so it can be inspected, but it must not
    /// be trusted as a completed operation.
    #[error("{source}")]
    Incomplete {
        /// Response returned by the server.
        response: Box<Response>,
        /// The failure that followed the RPC.
        source: Box<ClientError>,
    },
}

impl ClientError {
    /// Returns true if the server aborted the transaction, typically because
    /// of a conflicting commit. Such transactions can be retried from scratch.
    pub fn is_aborted(&self) -> bool {
        match self {
            ClientError::Transport(status) => status.code() == tonic::Code::Aborted,
            ClientError::Incomplete { source, .. } => source.is_aborted(),
            _ => false,
        }
    }

    /// Returns the server response attached to an [`ClientError::Incomplete`]
    /// failure.
    pub fn response(&self) -> Option<&Response> {
        match self {
            ClientError::Incomplete { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Returns the state carried by a [`ClientError::TransactionNotOk`].
    pub fn transaction_state(&self) -> Option<TransactionState> {
        match self {
            ClientError::TransactionNotOk(state) => Some(*state),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
