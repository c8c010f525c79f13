//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Project setup is incomplete
    #[error("Setup verification failed: {missing} required item(s) missing")]
    Verification {
        /// Number of missing required items
        missing: usize,
    },

    /// Smoke suite had failures
    #[error("Smoke run failed: {failed} of {total} test(s) failed")]
    SmokeFailed {
        /// Failed tests
        failed: usize,
        /// Tests run
        total: usize,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Library error
    #[error(transparent)]
    Double(#[from] webdouble::DoubleError),

    /// JSON error
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
}
