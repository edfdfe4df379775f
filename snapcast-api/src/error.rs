use rpc_client::RpcError;
use thiserror::Error;

/// High-level API errors for Snapcast operations
///
/// Every call-level variant carries the JSON-RPC method and the target it
/// was aimed at (a group or client id, or the server address for
/// server-wide calls), so a failure can be reported against the exact call
/// that produced it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server could not be reached or the socket failed mid-call
    #[error("{method} on {target}: network error: {message}")]
    NetworkError {
        method: String,
        target: String,
        message: String,
    },

    /// The server answered, but not with the shape we expected
    #[error("{method} on {target}: parse error: {message}")]
    ParseError {
        method: String,
        target: String,
        message: String,
    },

    /// The server rejected the call with a JSON-RPC error object
    #[error("{method} on {target}: server fault {code}: {message}")]
    Fault {
        method: String,
        target: String,
        code: i64,
        message: String,
    },

    /// A request parameter was rejected before anything was sent
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ApiError {
    /// Attach method and target to a transport error
    pub fn from_rpc(method: &str, target: &str, error: RpcError) -> Self {
        let method = method.to_string();
        let target = target.to_string();
        match error {
            RpcError::Network(message) => ApiError::NetworkError { method, target, message },
            RpcError::Parse(message) => ApiError::ParseError { method, target, message },
            RpcError::Fault { code, message } => ApiError::Fault {
                method,
                target,
                code,
                message,
            },
        }
    }

    /// The method this error belongs to, if it came from a call
    pub fn method(&self) -> Option<&str> {
        match self {
            ApiError::NetworkError { method, .. }
            | ApiError::ParseError { method, .. }
            | ApiError::Fault { method, .. } => Some(method),
            ApiError::InvalidParameter(_) => None,
        }
    }

    /// The group, client or server the failed call was aimed at
    pub fn target(&self) -> Option<&str> {
        match self {
            ApiError::NetworkError { target, .. }
            | ApiError::ParseError { target, .. }
            | ApiError::Fault { target, .. } => Some(target),
            ApiError::InvalidParameter(_) => None,
        }
    }
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_error_conversion() {
        let error = ApiError::from_rpc(
            "Server.GetStatus",
            "localhost:1705",
            RpcError::Network("connection refused".to_string()),
        );
        assert!(matches!(error, ApiError::NetworkError { .. }));
        assert_eq!(error.method(), Some("Server.GetStatus"));
        assert_eq!(error.target(), Some("localhost:1705"));

        let error = ApiError::from_rpc("Group.SetStream", "g1", RpcError::Parse("bad".to_string()));
        assert!(matches!(error, ApiError::ParseError { .. }));

        let error = ApiError::from_rpc(
            "Group.SetClients",
            "g1",
            RpcError::Fault {
                code: -32603,
                message: "Group not found".to_string(),
            },
        );
        assert!(matches!(error, ApiError::Fault { code: -32603, .. }));
    }

    #[test]
    fn test_error_display() {
        let error = ApiError::from_rpc(
            "Group.SetStream",
            "g1",
            RpcError::Fault {
                code: -32602,
                message: "Invalid params".to_string(),
            },
        );
        assert_eq!(
            error.to_string(),
            "Group.SetStream on g1: server fault -32602: Invalid params"
        );

        let error = ApiError::InvalidParameter("group id is empty".to_string());
        assert_eq!(error.to_string(), "Invalid parameter: group id is empty");
        assert_eq!(error.method(), None);
    }
}
