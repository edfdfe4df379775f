use std::path::PathBuf;

use roomcast_compiler::CompileError;
use snapcast_api::ApiError;
use thiserror::Error;

/// Errors from the process-management collaborators
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {code:?}: {stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Errors raised during a deployment run
///
/// `Compile`, `Locked`, `Configuration` and `Process` are fatal.
/// `ReconciliationTimeout` and `ControlProtocol` are recorded in the report
/// and the run carries on.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Compilation failed: {0}")]
    Compile(#[from] CompileError),

    #[error("Invalid deploy configuration: {0}")]
    Configuration(String),

    #[error("Another deployment holds {path}")]
    Locked { path: PathBuf },

    #[error("Lock file {path}: {source}")]
    LockIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing an artifact or driving a service failed
    #[error("{target}: {message}")]
    Process { target: String, message: String },

    #[error("Timed out waiting for room clients: {}", missing.join(", "))]
    ReconciliationTimeout { missing: Vec<String> },

    #[error("Stream {stream} -> [{}]: {source}", rooms.join(", "))]
    ControlProtocol {
        stream: String,
        rooms: Vec<String>,
        #[source]
        source: ApiError,
    },
}

impl DeployError {
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            DeployError::ReconciliationTimeout { .. } | DeployError::ControlProtocol { .. }
        )
    }

    pub(crate) fn process(target: impl Into<String>, message: impl ToString) -> Self {
        DeployError::Process {
            target: target.into(),
            message: message.to_string(),
        }
    }
}

/// Type alias for results that can return a DeployError
pub type Result<T> = std::result::Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality() {
        assert!(DeployError::process("/etc/asound.conf", "permission denied").is_fatal());
        assert!(DeployError::Locked { path: PathBuf::from("/tmp/x") }.is_fatal());
        assert!(!DeployError::ReconciliationTimeout {
            missing: vec!["room_bath".to_string()]
        }
        .is_fatal());
    }

    #[test]
    fn test_timeout_display() {
        let error = DeployError::ReconciliationTimeout {
            missing: vec!["room_bath".to_string(), "room_kitchen".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Timed out waiting for room clients: room_bath, room_kitchen"
        );
    }
}
