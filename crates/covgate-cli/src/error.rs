//! Error types for the CLI

use covgate::CovgateError;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Exit code for a passing run
pub const EXIT_PASS: u8 = 0;

/// Exit code when at least one domain or file rule fails
pub const EXIT_POLICY_FAILURE: u8 = 1;

/// Exit code for any other error
pub const EXIT_ERROR: u8 = 2;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Coverage is below policy
    #[error("Coverage policy failed: {failing} domain(s) and {failing_files} file(s) below threshold")]
    PolicyViolation {
        /// Failing domains
        failing: usize,
        /// Failing file rules
        failing_files: usize,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// covgate library error
    #[error(transparent)]
    Covgate(#[from] CovgateError),

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a policy violation
    #[must_use]
    pub const fn policy_violation(failing: usize, failing_files: usize) -> Self {
        Self::PolicyViolation {
            failing,
            failing_files,
        }
    }

    /// Process exit code for this error
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::PolicyViolation { .. } => EXIT_POLICY_FAILURE,
            _ => EXIT_ERROR,
        }
    }
}
