//! Typed operations grouped by method namespace
//!
//! - `server` - `Server.GetStatus`
//! - `group` - `Group.SetClients`, `Group.SetStream`, `Group.SetName`
//! - `client` - `Client.SetName`

pub mod client;
pub mod group;
pub mod server;

pub use client::{SetClientNameOperation, SetClientNameRequest};
pub use group::{
    SetGroupClientsOperation, SetGroupClientsRequest, SetGroupNameOperation, SetGroupNameRequest,
    SetGroupStreamOperation, SetGroupStreamRequest,
};
pub use server::{GetStatusOperation, GetStatusRequest, GetStatusResponse};

use crate::error::ApiError;

/// Reject an empty id before it reaches the wire
pub(crate) fn require_id(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidParameter(format!("{} must not be empty", field)));
    }
    Ok(())
}
