use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating a model
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model: {0}")]
    Parse(#[from] serde_json::Error),

    /// An id declared twice in one section
    #[error("Duplicate id '{id}' in {section}")]
    DuplicateId { section: String, id: String },

    #[error("Unsupported model version {found:?} (expected \"2.0\")")]
    UnsupportedVersion { found: String },

    /// A reference to an entity that is not declared
    #[error("{referrer} references unknown {kind} '{id}'")]
    UnresolvedReference {
        kind: &'static str,
        id: String,
        referrer: String,
    },

    /// A numeric field outside its allowed bounds
    #[error("{owner}: {field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        owner: String,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Room '{room}' has neither a left nor a right speaker")]
    EmptyRoom { room: String },
}

/// Type alias for results that can return a ConfigError
pub type Result<T> = std::result::Result<T, ConfigError>;
