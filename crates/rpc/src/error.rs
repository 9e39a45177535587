//! Error types for RPC operations.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur talking to a Sui fullnode.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Unexpected response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for RpcError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RpcError::Timeout(err.to_string())
        } else if err.is_decode() {
            RpcError::MalformedResponse(err.to_string())
        } else {
            RpcError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::MalformedResponse(err.to_string())
    }
}

impl RpcError {
    /// Returns true if the next poll may well succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RpcError::Transport(_) | RpcError::Timeout(_) => true,
            RpcError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            RpcError::Rpc { .. } | RpcError::MalformedResponse(_) => false,
        }
    }

    /// Suggested extra wait before retrying, if any.
    pub fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            RpcError::HttpStatus { status: 429, .. } => Some(Duration::from_secs(10)),
            RpcError::Timeout(_) => Some(Duration::from_secs(2)),
            _ => None,
        }
    }
}

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;
