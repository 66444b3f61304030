//! Unified error type for callers that do not care which layer failed.

use crate::client::ClientError;
use crate::transport::CodecError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i32, message: String },

    #[error("Connection closed")]
    Disconnected,

    #[error("Request timeout")]
    Timeout,

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Unexpected response")]
    UnexpectedResponse,
}

impl From<ClientError> for Error {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Io(e) => Self::Io(e),
            ClientError::Codec(e) => Self::Codec(e),
            ClientError::Json(e) => Self::Json(e),
            ClientError::Rpc { code, message, .. } => Self::Rpc { code, message },
            ClientError::ConnectionClosed => Self::Disconnected,
            ClientError::Timeout => Self::Timeout,
            ClientError::UnexpectedResponse => Self::UnexpectedResponse,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
