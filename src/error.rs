//! Error types for the data architecture managers

use thiserror::Error;

use crate::schema::validator::ValidationReport;

/// Result type for manager operations
pub type Result<T> = std::result::Result<T, ArchError>;

/// Data architecture errors
#[derive(Error, Debug)]
pub enum ArchError {
    #[error("Not found: {kind} {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Already exists: {kind} {id}")]
    AlreadyExists { kind: &'static str, id: String },

    #[error("Validation failed: {}", .0.errors.join("; "))]
    Validation(ValidationReport),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("No {0} registered")]
    CapabilityMissing(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Semver error: {0}")]
    Semver(#[from] semver::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ArchError {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    pub(crate) fn already_exists(kind: &'static str, id: impl Into<String>) -> Self {
        Self::AlreadyExists { kind, id: id.into() }
    }

    /// True for the not-found branch of the taxonomy
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
