//! Result and error types for webdouble.
//!
//! The mock backend never produces an error. These variants exist for the
//! real backend, configuration loading and fixture lifecycle.

use thiserror::Error;

/// Result type for webdouble operations
pub type DoubleResult<T> = Result<T, DoubleError>;

/// Errors that can occur in webdouble
#[derive(Debug, Error)]
pub enum DoubleError {
    /// Requested backend was not compiled in
    #[error("Backend '{backend}' is not available. Rebuild with the 'browser' feature")]
    BackendUnavailable {
        /// Backend name
        backend: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// No element matched a locator before the implicit wait elapsed
    #[error("No element found for {locator} after {waited_ms}ms")]
    ElementNotFound {
        /// Locator key
        locator: String,
        /// Time spent polling
        waited_ms: u64,
    },

    /// Element interaction error
    #[error("Element interaction failed: {message}")]
    Interaction {
        /// Error message
        message: String,
    },

    /// Script evaluation error
    #[error("Script evaluation failed: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Fixture error (setup/teardown failed)
    #[error("Fixture error: {message}")]
    Fixture {
        /// Error message
        message: String,
    },

    /// Assertion failed inside a test body
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DoubleError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a fixture error
    #[must_use]
    pub fn fixture(message: impl Into<String>) -> Self {
        Self::Fixture {
            message: message.into(),
        }
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }
}

/// Fail a test body with `DoubleError::AssertionFailed` unless the condition holds.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::DoubleError::assertion(format!($($arg)+)));
        }
    };
}
