//! Private JSON-RPC client for the Snapcast control endpoint
//!
//! Snapcast exposes JSON-RPC 2.0 on a plain TCP socket (port 1705 by
//! default), one JSON object per line. This crate owns the socket and the
//! request/response envelope; the typed methods live in `snapcast-api`.
//!
//! Every call opens its own connection and makes exactly one attempt.
//! Retrying is left to the caller.

mod error;

pub use error::RpcError;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Default Snapcast control port
pub const DEFAULT_PORT: u16 = 1705;

/// A minimal JSON-RPC client for one Snapcast server
#[derive(Debug, Clone)]
pub struct RpcClient {
    address: String,
    connect_timeout: Duration,
    read_timeout: Duration,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    /// Create a client for `host:port` with the default 5 second timeouts
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            address: format!("{}:{}", host, port),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Override the connect and read timeouts
    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }

    /// The `host:port` this client talks to
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Send one request and wait for the matching response
    ///
    /// Notifications the server pushes on the same socket (objects without
    /// an `id`, or with a different one) are skipped.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = build_request(id, method, params);
        let mut line = request.to_string();
        line.push_str("\r\n");

        tracing::debug!(address = %self.address, method, id, "sending JSON-RPC request");

        let stream = timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| RpcError::Network(format!("connection to {} timed out", self.address)))?
            .map_err(|e| RpcError::Network(format!("{}: {}", self.address, e)))?;

        let (reader, mut writer) = stream.into_split();
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| RpcError::Network(e.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|e| RpcError::Network(e.to_string()))?;

        let mut reader = BufReader::new(reader);
        let mut buffer = String::new();
        loop {
            buffer.clear();
            let read = timeout(self.read_timeout, reader.read_line(&mut buffer))
                .await
                .map_err(|_| RpcError::Network(format!("no response to {} within {:?}", method, self.read_timeout)))?
                .map_err(|e| RpcError::Network(e.to_string()))?;

            if read == 0 {
                return Err(RpcError::Network(format!(
                    "connection closed before response to {}",
                    method
                )));
            }

            let text = buffer.trim();
            if text.is_empty() {
                continue;
            }

            let value: Value =
                serde_json::from_str(text).map_err(|e| RpcError::Parse(e.to_string()))?;

            if value.get("id").and_then(Value::as_u64) != Some(id) {
                tracing::trace!(method, "skipping notification while waiting for response");
                continue;
            }

            return extract_response(value);
        }
    }
}

fn build_request(id: u64, method: &str, params: Option<Value>) -> Value {
    let mut request = json!({
        "id": id,
        "jsonrpc": "2.0",
        "method": method,
    });
    if let Some(params) = params {
        request["params"] = params;
    }
    request
}

/// Pull the `result` out of a response envelope, or turn `error` into a fault
fn extract_response(mut response: Value) -> Result<Value, RpcError> {
    if let Some(error) = response.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(-32603);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string();
        return Err(RpcError::Fault { code, message });
    }

    response
        .get_mut("result")
        .map(Value::take)
        .ok_or_else(|| RpcError::Parse("Missing result element".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_without_params() {
        let request = build_request(7, "Server.GetStatus", None);
        assert_eq!(request["id"], 7);
        assert_eq!(request["jsonrpc"], "2.0");
        assert_eq!(request["method"], "Server.GetStatus");
        assert!(request.get("params").is_none());
    }

    #[test]
    fn test_build_request_with_params() {
        let request = build_request(
            1,
            "Group.SetStream",
            Some(json!({"id": "g1", "stream_id": "Spotify Haus"})),
        );
        assert_eq!(request["params"]["stream_id"], "Spotify Haus");
    }

    #[test]
    fn test_extract_response_with_result() {
        let response = json!({"id": 1, "jsonrpc": "2.0", "result": {"stream_id": "default"}});
        let result = extract_response(response).unwrap();
        assert_eq!(result["stream_id"], "default");
    }

    #[test]
    fn test_extract_response_with_error() {
        let response = json!({
            "id": 1,
            "jsonrpc": "2.0",
            "error": {"code": -32602, "message": "Invalid params"}
        });
        match extract_response(response).unwrap_err() {
            RpcError::Fault { code, message } => {
                assert_eq!(code, -32602);
                assert_eq!(message, "Invalid params");
            }
            other => panic!("Expected RpcError::Fault, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_response_error_defaults() {
        let response = json!({"id": 1, "jsonrpc": "2.0", "error": {}});
        match extract_response(response).unwrap_err() {
            RpcError::Fault { code, message } => {
                assert_eq!(code, -32603);
                assert_eq!(message, "Unknown error");
            }
            other => panic!("Expected RpcError::Fault, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_response_missing_result() {
        let response = json!({"id": 1, "jsonrpc": "2.0"});
        match extract_response(response).unwrap_err() {
            RpcError::Parse(msg) => assert!(msg.contains("Missing result")),
            other => panic!("Expected RpcError::Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_client_address() {
        let client = RpcClient::new("localhost", DEFAULT_PORT);
        assert_eq!(client.address(), "localhost:1705");
    }
}
