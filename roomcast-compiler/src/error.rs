use std::fmt;

use roomcast_config::ConfigError;
use thiserror::Error;

/// How two generated names clash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// Two declarations share one name
    Collision,
    /// A client selecting the first name by prefix would also match the second
    Prefix,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::Collision => write!(f, "collides with"),
            ConflictKind::Prefix => write!(f, "is a prefix of"),
        }
    }
}

/// Compilation errors
///
/// Compilation is all-or-nothing: any of these means no artifact is
/// produced.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A reference does not resolve, or the model is otherwise malformed
    #[error("Validation error: {0}")]
    Validation(#[source] ConfigError),

    /// A numeric field is out of bounds
    #[error("Range error: {0}")]
    Range(#[source] ConfigError),

    #[error("Naming conflict: '{name}' {kind} '{conflicts_with}'")]
    NamingConflict {
        name: String,
        conflicts_with: String,
        kind: ConflictKind,
    },
}

impl From<ConfigError> for CompileError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::OutOfRange { .. } => CompileError::Range(error),
            other => CompileError::Validation(other),
        }
    }
}

/// Type alias for results that can return a CompileError
pub type Result<T> = std::result::Result<T, CompileError>;
