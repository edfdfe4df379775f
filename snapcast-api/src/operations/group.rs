//! Group namespace operations
//!
//! All three setters answer with a fragment of the new server state. The
//! caller re-reads status when it needs it, so the result is discarded.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use super::require_id;
use crate::error::ApiError;
use crate::operation::SnapcastOperation;
use crate::service::Service;

// =============================================================================
// SET CLIENTS
// =============================================================================

/// Replace a group's membership with exactly `clients`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetGroupClientsRequest {
    pub id: String,
    pub clients: Vec<String>,
}

pub struct SetGroupClientsOperation;

impl SnapcastOperation for SetGroupClientsOperation {
    type Request = SetGroupClientsRequest;
    type Response = ();

    const SERVICE: Service = Service::Group;
    const ACTION: &'static str = "SetClients";

    fn target(request: &Self::Request) -> Option<String> {
        Some(request.id.clone())
    }

    fn validate(request: &Self::Request) -> Result<(), ApiError> {
        require_id("group id", &request.id)?;
        let mut seen = BTreeSet::new();
        for client in &request.clients {
            require_id("client id", client)?;
            if !seen.insert(client.as_str()) {
                return Err(ApiError::InvalidParameter(format!(
                    "client {} listed twice for group {}",
                    client, request.id
                )));
            }
        }
        Ok(())
    }

    fn parse_response(_result: Value) -> Result<(), ApiError> {
        Ok(())
    }
}

// =============================================================================
// SET STREAM
// =============================================================================

/// Point a group at a server stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetGroupStreamRequest {
    pub id: String,
    pub stream_id: String,
}

pub struct SetGroupStreamOperation;

impl SnapcastOperation for SetGroupStreamOperation {
    type Request = SetGroupStreamRequest;
    type Response = ();

    const SERVICE: Service = Service::Group;
    const ACTION: &'static str = "SetStream";

    fn target(request: &Self::Request) -> Option<String> {
        Some(request.id.clone())
    }

    fn validate(request: &Self::Request) -> Result<(), ApiError> {
        require_id("group id", &request.id)?;
        require_id("stream id", &request.stream_id)
    }

    fn parse_response(_result: Value) -> Result<(), ApiError> {
        Ok(())
    }
}

// =============================================================================
// SET NAME
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetGroupNameRequest {
    pub id: String,
    pub name: String,
}

pub struct SetGroupNameOperation;

impl SnapcastOperation for SetGroupNameOperation {
    type Request = SetGroupNameRequest;
    type Response = ();

    const SERVICE: Service = Service::Group;
    const ACTION: &'static str = "SetName";

    fn target(request: &Self::Request) -> Option<String> {
        Some(request.id.clone())
    }

    fn validate(request: &Self::Request) -> Result<(), ApiError> {
        require_id("group id", &request.id)
    }

    fn parse_response(_result: Value) -> Result<(), ApiError> {
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
