use serde::Serialize;
use serde_json::Value;

use super::require_id;
use crate::error::ApiError;
use crate::operation::SnapcastOperation;
use crate::service::Service;

/// Set the display name of a client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetClientNameRequest {
    pub id: String,
    pub name: String,
}

pub struct SetClientNameOperation;

impl SnapcastOperation for SetClientNameOperation {
    type Request = SetClientNameRequest;
    type Response = ();

    const SERVICE: Service = Service::Client;
    const ACTION: &'static str = "SetName";

    fn target(request: &Self::Request) -> Option<String> {
        Some(request.id.clone())
    }

    fn validate(request: &Self::Request) -> Result<(), ApiError> {
        require_id("client id", &request.id)
    }

    fn parse_response(_result: Value) -> Result<(), ApiError> {
        Ok(())
    }
}
