//! Error types for Hostkit
//!
//! All modules use `HostkitResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Hostkit operations
pub type HostkitResult<T> = Result<T, HostkitError>;

/// All errors that can occur in Hostkit
#[derive(Error, Debug)]
pub enum HostkitError {
    // Registry errors
    #[error("Capability set not initialized: call registry::install() during bootstrap")]
    NotInitialized,

    #[error("Capability set already installed for runtime '{runtime}'")]
    AlreadyInstalled { runtime: String },

    #[error("Invalid capability set, missing: {}", missing.join(", "))]
    InvalidCapabilitySet { missing: Vec<&'static str> },

    // Cache errors
    #[error("Cache store '{store}' unavailable: {reason}")]
    AdapterUnavailable { store: String, reason: String },

    // Collaborator errors
    #[error("Script evaluation is not supported by runtime '{runtime}'")]
    EvaluationUnsupported { runtime: String },

    #[error("Script evaluation failed: {0}")]
    Evaluation(String),

    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Form field '{field}' holds a file; multipart encoding is left to the fetch implementation")]
    FormFileField { field: String },

    #[error("Form encoding error: {0}")]
    FormEncode(#[from] serde_urlencoded::ser::Error),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HostkitError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a store-unavailable error
    pub fn unavailable(store: impl Into<String>, reason: impl ToString) -> Self {
        Self::AdapterUnavailable {
            store: store.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if error is retryable by the caller
    ///
    /// Hostkit itself never retries; this only classifies.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AdapterUnavailable { .. } | Self::Fetch { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Install a capability set during application bootstrap"),
            Self::AlreadyInstalled { .. } => {
                Some("Install exactly once; call registry::reset() first to tear down")
            }
            Self::InvalidCapabilitySet { .. } => {
                Some("Provide every field on CapabilitySetBuilder before build()")
            }
            Self::EvaluationUnsupported { .. } => Some("Supply an Evaluator for this runtime"),
            _ => None,
        }
    }
}
