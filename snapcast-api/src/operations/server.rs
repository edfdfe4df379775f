use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::operation::SnapcastOperation;
use crate::service::Service;
use crate::status::ServerStatus;

/// `Server.GetStatus` takes no parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GetStatusRequest;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GetStatusResponse {
    pub server: ServerStatus,
}

/// Fetch the full group, client and stream snapshot
pub struct GetStatusOperation;

impl SnapcastOperation for GetStatusOperation {
    type Request = GetStatusRequest;
    type Response = GetStatusResponse;

    const SERVICE: Service = Service::Server;
    const ACTION: &'static str = "GetStatus";

    fn build_params(_request: &Self::Request) -> Result<Option<Value>, ApiError> {
        Ok(None)
    }
}
