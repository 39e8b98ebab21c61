//! Result and error types for covgate.
//!
//! Policy violations are not errors: a failing domain is reported through
//! [`crate::EvaluationResult::passed`]. The variants below abort a run.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for covgate operations
pub type CovgateResult<T> = Result<T, CovgateError>;

/// Errors that can occur in covgate
#[derive(Debug, Error)]
pub enum CovgateError {
    /// Invalid policy or configuration file (raised before any parsing)
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// A coverage profile could not be read or decoded
    #[error("Failed to parse coverage profile {}: {message}", path.display())]
    Parse {
        /// Profile path
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Module root or domain directory lookup failed
    #[error("Resolution failed: {message}")]
    Resolution {
        /// Error message
        message: String,
    },

    /// History store could not be read or written
    #[error("History error: {message}")]
    History {
        /// Error message
        message: String,
    },

    /// An external collaborator (git, scanner) failed
    #[error("{collaborator} failed: {message}")]
    Collaborator {
        /// Collaborator name
        collaborator: &'static str,
        /// Error message
        message: String,
    },

    /// File watcher setup failed
    #[error("Watch error: {message}")]
    Watch {
        /// Error message
        message: String,
    },

    /// Watch loop was cancelled
    #[error("Cancelled: {reason}")]
    Cancelled {
        /// Cancellation reason
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl CovgateError {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a parse error for a profile path
    #[must_use]
    pub fn parse(path: &Path, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Create a resolution error
    #[must_use]
    pub fn resolution(message: impl Into<String>) -> Self {
        Self::Resolution {
            message: message.into(),
        }
    }

    /// Create a history error
    #[must_use]
    pub fn history(message: impl Into<String>) -> Self {
        Self::History {
            message: message.into(),
        }
    }

    /// Create a collaborator error
    #[must_use]
    pub fn collaborator(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self::Collaborator {
            collaborator,
            message: message.into(),
        }
    }

    /// Create a watch error
    #[must_use]
    pub fn watch(message: impl Into<String>) -> Self {
        Self::Watch {
            message: message.into(),
        }
    }

    /// Create a cancellation error
    #[must_use]
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled {
            reason: reason.into(),
        }
    }

    /// Whether this error is a configuration problem
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}
