//! Seams to the outside world
//!
//! The reconciler only talks to these traits. Production implementations
//! live in [`crate::systemd`] and [`crate::artifacts`]; tests substitute
//! in-memory fakes.

use std::path::Path;

use async_trait::async_trait;
use snapcast_api::{ServerStatus, SnapcastClient};

use crate::error::ServiceError;

/// Observed state of a managed service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceStatus {
    Active,
    Inactive,
    Failed,
    Other(String),
}

impl ServiceStatus {
    pub fn from_is_active(output: &str) -> Self {
        match output.trim() {
            "active" => ServiceStatus::Active,
            "inactive" => ServiceStatus::Inactive,
            "failed" => ServiceStatus::Failed,
            other => ServiceStatus::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceStatus::Active => write!(f, "active"),
            ServiceStatus::Inactive => write!(f, "inactive"),
            ServiceStatus::Failed => write!(f, "failed"),
            ServiceStatus::Other(state) => write!(f, "{}", state),
        }
    }
}

/// Process management by logical service name
#[async_trait]
pub trait ServiceManager: Send + Sync {
    async fn restart(&self, service: &str) -> Result<(), ServiceError>;
    async fn start(&self, service: &str) -> Result<(), ServiceError>;
    async fn stop(&self, service: &str) -> Result<(), ServiceError>;
    async fn enable(&self, service: &str) -> Result<(), ServiceError>;
    async fn disable(&self, service: &str) -> Result<(), ServiceError>;
    async fn status(&self, service: &str) -> Result<ServiceStatus, ServiceError>;
}

/// Ensures one streaming client runs for a room device
///
/// Which server the client connects to is fixed when the launcher is
/// built. Implementations must be idempotent: calling it for a client that
/// is already running is not an error.
#[async_trait]
pub trait ClientLauncher: Send + Sync {
    async fn ensure_running(&self, device: &str) -> Result<(), ServiceError>;
}

/// Writes a generated artifact to its destination
#[async_trait]
pub trait ArtifactWriter: Send + Sync {
    async fn write(&self, path: &Path, contents: &str) -> std::io::Result<()>;
}

/// The part of the control protocol the reconciler needs
#[async_trait]
pub trait GroupControl: Send + Sync {
    async fn status(&self) -> snapcast_api::Result<ServerStatus>;
    async fn set_group_clients(&self, group_id: &str, clients: &[String]) -> snapcast_api::Result<()>;
    async fn set_group_stream(&self, group_id: &str, stream_id: &str) -> snapcast_api::Result<()>;
    async fn set_group_name(&self, group_id: &str, name: &str) -> snapcast_api::Result<()>;
    async fn set_client_name(&self, client_id: &str, name: &str) -> snapcast_api::Result<()>;
}

#[async_trait]
impl GroupControl for SnapcastClient {
    async fn status(&self) -> snapcast_api::Result<ServerStatus> {
        SnapcastClient::status(self).await
    }

    async fn set_group_clients(&self, group_id: &str, clients: &[String]) -> snapcast_api::Result<()> {
        SnapcastClient::set_group_clients(self, group_id, clients).await
    }

    async fn set_group_stream(&self, group_id: &str, stream_id: &str) -> snapcast_api::Result<()> {
        SnapcastClient::set_group_stream(self, group_id, stream_id).await
    }

    async fn set_group_name(&self, group_id: &str, name: &str) -> snapcast_api::Result<()> {
        SnapcastClient::set_group_name(self, group_id, name).await
    }

    async fn set_client_name(&self, client_id: &str, name: &str) -> snapcast_api::Result<()> {
        SnapcastClient::set_client_name(self, client_id, name).await
    }
}
