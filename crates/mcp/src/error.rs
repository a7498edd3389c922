//! MCP error types.

use crate::protocol::JsonRpcError;
use thiserror::Error;

/// JSON-RPC error code for an unparseable message.
pub const PARSE_ERROR: i32 = -32700;
/// JSON-RPC error code for a malformed request object.
pub const INVALID_REQUEST: i32 = -32600;
/// JSON-RPC error code for an unknown method.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// JSON-RPC error code for bad method parameters.
pub const INVALID_PARAMS: i32 = -32602;
/// JSON-RPC error code for a failure inside the server.
pub const INTERNAL_ERROR: i32 = -32603;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("JSON-RPC error: {0}")]
    JsonRpc(#[from] JsonRpcError),

    #[error("writer task stopped before all responses were sent")]
    WriterClosed,

    #[error("message too large (max {max} bytes)")]
    MessageTooLarge { max: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

impl JsonRpcError {
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(PARSE_ERROR, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("method not found: {method}"))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }
}
