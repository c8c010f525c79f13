//! Webdouble: browser automation doubles for headless end-to-end suites
//!
//! Suites written against the [`WebDriver`] traits run unchanged on a
//! developer desktop (real browser) and in CI (in-memory mock). The
//! backend is picked once per session from the environment.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │   ┌────────────┐    ┌────────────┐    ┌─────────────────────┐   │
//! │   │ TestSuite  │    │ TestSession│    │ DriverProvider      │   │
//! │   │ + markers  │───►│ + fixtures │───►│  MockProvider       │   │
//! │   │            │    │            │    │  ChromiumProvider   │   │
//! │   └────────────┘    └────────────┘    └─────────────────────┘   │
//! │          ▲                                      │               │
//! │          │          ┌────────────┐              ▼               │
//! │          └──────────│ PageDriver │◄──── WebDriver / WebElement  │
//! │                     └────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use webdouble::{Locator, MockDriver, TraceSink, WebDriver};
//!
//! let mut driver = MockDriver::with_sink(TraceSink::silent());
//! driver.get("file:///admin.html").unwrap();
//! let a = driver.find_element(&Locator::id("addUserBtn"));
//! let b = driver.find_element(&Locator::id("addUserBtn"));
//! assert!(a.same_node(&b));
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::significant_drop_tightening)]
pub mod chromium;
pub mod config;
pub mod driver;
pub mod element;
pub mod env;
pub mod fixture;
pub mod harness;
pub mod locator;
pub mod logging;
pub mod page_object;
pub mod provider;
mod result;
pub mod select;
pub mod trace;

#[cfg(feature = "browser")]
pub use chromium::{ChromiumDriver, ChromiumElement, ChromiumProvider, ChromiumSelect};
pub use config::{
    BackendChoice, BrowserKind, DriverOptions, HarnessConfig, SlowMotion, DEFAULT_CONFIG_FILE,
};
pub use driver::{
    DriverState, MockDriver, SelectElement, WebDriver, WebElement, DEFAULT_IMPLICIT_WAIT,
    DEFAULT_PAGE_LOAD_TIMEOUT,
};
pub use element::{AttrKey, ElementAttributes, ElementId, MockElement};
pub use env::{
    EnvSource, EnvironmentDetector, EnvironmentReport, MapEnv, ProcessEnv, CI_INDICATOR_VARS,
    DISPLAY_VAR,
};
pub use fixture::{DriverFixture, Fixture, FixtureManager, FixtureState, SessionFixture};
pub use harness::{
    Marker, RunOptions, SuiteResults, TestCase, TestContext, TestResult, TestSession, TestSuite,
};
pub use locator::{By, Locator, DEFAULT_POLL_INTERVAL_MS};
pub use logging::LogOptions;
pub use page_object::{LocatorTable, PageDriver, PageObject, SelectBy};
pub use provider::{resolve_backend, select_provider, Backend, DriverProvider, MockProvider};
pub use result::{DoubleError, DoubleResult};
pub use select::MockSelect;
pub use trace::{TraceEvent, TraceSink, TRACE_TAG};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        ensure, By, DoubleError, DoubleResult, DriverProvider, EnvironmentDetector, HarnessConfig,
        Locator, LocatorTable, Marker, MockDriver, MockElement, MockSelect, PageDriver,
        PageObject, SelectBy, SelectElement, TestCase, TestContext, TestSession, TestSuite,
        TraceSink, WebDriver, WebElement,
    };
}
