//! Log subscriber setup.
//!
//! Logs go to stderr; stdout is left to `[MOCK]` trace lines and command
//! output. `RUST_LOG` overrides the level picked from verbosity.

use crate::result::{DoubleError, DoubleResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogOptions {
    /// 0 warn, 1 info, 2 debug, 3+ trace
    pub verbosity: u8,
    /// Suppress everything but errors
    pub quiet: bool,
    /// JSON lines instead of text
    pub json: bool,
}

impl LogOptions {
    /// Filter directive for these options
    #[must_use]
    pub const fn level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails if a subscriber is already installed.
pub fn init(options: LogOptions) -> DoubleResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(options.level()));
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(options.verbosity >= 2);

    let installed = if options.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()
    };
    installed.map_err(|e| DoubleError::config(format!("logging already initialized: {e}")))
}
