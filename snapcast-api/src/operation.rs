//! Operation trait shared by every Snapcast control method

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::service::Service;

/// Base trait for all Snapcast API operations
///
/// Each control method is a zero-sized type implementing this trait. The
/// associated types give the request and response shapes; the defaults
/// cover the common case where both map 1:1 onto JSON.
pub trait SnapcastOperation {
    /// The request type for this operation
    type Request: Serialize;

    /// The response type for this operation
    type Response: DeserializeOwned;

    /// The namespace this operation belongs to
    const SERVICE: Service;

    /// The action name within the namespace
    const ACTION: &'static str;

    /// Full JSON-RPC method name, e.g. `Group.SetStream`
    fn method() -> String {
        Self::SERVICE.method(Self::ACTION)
    }

    /// The id of the group or client the request is aimed at
    ///
    /// `None` means the call is server-wide.
    fn target(_request: &Self::Request) -> Option<String> {
        None
    }

    /// Reject requests that the server would refuse anyway
    fn validate(_request: &Self::Request) -> Result<(), ApiError> {
        Ok(())
    }

    /// Build the `params` member of the request envelope
    fn build_params(request: &Self::Request) -> Result<Option<Value>, ApiError> {
        serde_json::to_value(request)
            .map(Some)
            .map_err(|e| ApiError::InvalidParameter(e.to_string()))
    }

    /// Turn the `result` member into the typed response
    fn parse_response(result: Value) -> Result<Self::Response, ApiError> {
        serde_json::from_value(result).map_err(|e| ApiError::ParseError {
            method: Self::method(),
            target: String::new(),
            message: e.to_string(),
        })
    }
}
