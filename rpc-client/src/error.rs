//! Error types for the JSON-RPC client

use thiserror::Error;

/// Errors that can occur during JSON-RPC communication
#[derive(Debug, Error)]
pub enum RpcError {
    /// Socket-level failure: refused connection, reset, timeout
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with something that is not a JSON-RPC response
    #[error("JSON parsing error: {0}")]
    Parse(String),

    /// JSON-RPC error object returned by the server
    #[error("JSON-RPC fault {code}: {message}")]
    Fault { code: i64, message: String },
}
