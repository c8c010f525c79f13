//! Driver providers.
//!
//! A provider is chosen once per session and handed to fixtures and page
//! helpers; nothing global is patched. Every driver, select wrapper and
//! driver-executable lookup of a session goes through the same provider.

use crate::config::{BackendChoice, BrowserKind, DriverOptions, HarnessConfig};
use crate::driver::{MockDriver, SelectElement, WebDriver, WebElement};
use crate::element::MockElement;
use crate::env::{EnvSource, EnvironmentDetector};
use crate::result::{DoubleError, DoubleResult};
use crate::select::MockSelect;
use crate::trace::TraceSink;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Concrete backend behind a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-memory doubles
    Mock,
    /// Real browser over CDP
    Chromium,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mock => write!(f, "mock"),
            Self::Chromium => write!(f, "chromium"),
        }
    }
}

/// Factory for drivers and dropdown wrappers
pub trait DriverProvider: fmt::Debug + Send + Sync {
    /// Which backend this provider builds
    fn backend(&self) -> Backend;

    /// Path of the driver executable for `browser`
    fn driver_executable(&self, browser: BrowserKind) -> DoubleResult<PathBuf>;

    /// Start a new driver session
    fn new_driver(&self, options: &DriverOptions) -> DoubleResult<Box<dyn WebDriver>>;

    /// Wrap a `<select>` element
    fn new_select(&self, element: Box<dyn WebElement>) -> DoubleResult<Box<dyn SelectElement>>;
}

/// Provider of in-memory doubles
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    sink: Option<TraceSink>,
}

impl MockProvider {
    /// Create new mock provider; each driver gets its own trace sink
    #[must_use]
    pub const fn new() -> Self {
        Self { sink: None }
    }

    /// Record every driver of this provider into `sink`
    #[must_use]
    pub const fn with_sink(sink: TraceSink) -> Self {
        Self { sink: Some(sink) }
    }

    /// Shared sink, if one was given
    #[must_use]
    pub const fn sink(&self) -> Option<&TraceSink> {
        self.sink.as_ref()
    }

    fn sink_for(&self, echo: bool) -> TraceSink {
        self.sink.clone().unwrap_or_else(|| TraceSink::new(echo))
    }
}

impl DriverProvider for MockProvider {
    fn backend(&self) -> Backend {
        Backend::Mock
    }

    fn driver_executable(&self, browser: BrowserKind) -> DoubleResult<PathBuf> {
        let path = PathBuf::from(format!("/mock/path/to/{browser}_driver"));
        self.sink_for(true).emit(
            "driver_executable",
            0,
            format!("Installing {browser} driver: {}", path.display()),
        );
        Ok(path)
    }

    fn new_driver(&self, options: &DriverOptions) -> DoubleResult<Box<dyn WebDriver>> {
        Ok(Box::new(MockDriver::with_sink(
            self.sink_for(options.echo_trace),
        )))
    }

    fn new_select(&self, element: Box<dyn WebElement>) -> DoubleResult<Box<dyn SelectElement>> {
        let mock = element
            .as_any()
            .downcast_ref::<MockElement>()
            .ok_or_else(|| DoubleError::Interaction {
                message: format!("{} is not a mock element", element.id()),
            })?;
        Ok(Box::new(MockSelect::new(mock.clone())))
    }
}

/// Resolve which backend a configuration asks for in this environment
#[must_use]
pub fn resolve_backend<E: EnvSource>(
    choice: BackendChoice,
    detector: &EnvironmentDetector<E>,
) -> Backend {
    match choice {
        BackendChoice::Mock => Backend::Mock,
        BackendChoice::Real => Backend::Chromium,
        BackendChoice::Auto if detector.is_headless() => Backend::Mock,
        BackendChoice::Auto => {
            if cfg!(feature = "browser") {
                Backend::Chromium
            } else {
                tracing::warn!(
                    "display available but the 'browser' feature is off; using mock backend"
                );
                Backend::Mock
            }
        }
    }
}

/// Pick the provider for a session
///
/// Called once; the returned provider is shared by every fixture of the
/// session.
///
/// # Errors
///
/// `BackendUnavailable` when a real browser is requested without the
/// `browser` feature.
pub fn select_provider<E: EnvSource>(
    config: &HarnessConfig,
    detector: &EnvironmentDetector<E>,
) -> DoubleResult<Arc<dyn DriverProvider>> {
    let backend = resolve_backend(config.backend, detector);
    tracing::info!(%backend, browser = %config.browser, "selected driver provider");
    match backend {
        Backend::Mock => Ok(Arc::new(MockProvider::new())),
        Backend::Chromium => chromium_provider(),
    }
}

#[cfg(feature = "browser")]
fn chromium_provider() -> DoubleResult<Arc<dyn DriverProvider>> {
    Ok(Arc::new(crate::chromium::ChromiumProvider::new()))
}

#[cfg(not(feature = "browser"))]
fn chromium_provider() -> DoubleResult<Arc<dyn DriverProvider>> {
    Err(DoubleError::BackendUnavailable {
        backend: Backend::Chromium.to_string(),
    })
}
