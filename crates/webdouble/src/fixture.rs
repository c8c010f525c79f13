//! Fixture management.
//!
//! Fixtures are set up highest priority first and torn down in reverse
//! order. When one fails to set up, everything already set up is torn down
//! before the error is returned.

use crate::config::HarnessConfig;
use crate::driver::WebDriver;
use crate::provider::DriverProvider;
use crate::result::{DoubleError, DoubleResult};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Something a test needs prepared before it runs and cleaned up after
pub trait Fixture: Any + Send + Sync {
    /// Set up the fixture.
    ///
    /// # Errors
    ///
    /// Returns an error if setup fails.
    fn setup(&mut self) -> DoubleResult<()>;

    /// Tear down the fixture.
    ///
    /// # Errors
    ///
    /// Returns an error if teardown fails.
    fn teardown(&mut self) -> DoubleResult<()>;

    /// Name used in logs and errors
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Higher is set up first and torn down last
    fn priority(&self) -> i32 {
        0
    }
}

/// State of a registered fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    /// Registered, never set up
    Registered,
    /// Set up successfully
    SetUp,
    /// Torn down
    TornDown,
    /// Setup or teardown failed
    Failed,
}

struct FixtureEntry {
    fixture: Box<dyn Fixture>,
    state: FixtureState,
    priority: i32,
}

/// Registry of fixtures keyed by type
#[derive(Default)]
pub struct FixtureManager {
    fixtures: HashMap<TypeId, FixtureEntry>,
    setup_order: Vec<TypeId>,
}

impl std::fmt::Debug for FixtureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureManager")
            .field("fixtures", &self.list())
            .field("set_up", &self.setup_order.len())
            .finish()
    }
}

impl FixtureManager {
    /// Create an empty manager
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fixture, replacing one of the same type
    pub fn register<F: Fixture>(&mut self, fixture: F) {
        let priority = fixture.priority();
        let _ = self.fixtures.insert(
            TypeId::of::<F>(),
            FixtureEntry {
                fixture: Box::new(fixture),
                state: FixtureState::Registered,
                priority,
            },
        );
    }

    /// Whether a fixture of type `F` is registered
    #[must_use]
    pub fn is_registered<F: Fixture>(&self) -> bool {
        self.fixtures.contains_key(&TypeId::of::<F>())
    }

    /// Number of registered fixtures
    #[must_use]
    pub fn count(&self) -> usize {
        self.fixtures.len()
    }

    /// State of the fixture of type `F`
    #[must_use]
    pub fn state<F: Fixture>(&self) -> Option<FixtureState> {
        self.fixtures.get(&TypeId::of::<F>()).map(|e| e.state)
    }

    /// Borrow the fixture of type `F`
    #[must_use]
    pub fn get<F: Fixture>(&self) -> Option<&F> {
        self.fixtures
            .get(&TypeId::of::<F>())
            .and_then(|e| (e.fixture.as_ref() as &dyn Any).downcast_ref::<F>())
    }

    /// Mutably borrow the fixture of type `F`
    #[must_use]
    pub fn get_mut<F: Fixture>(&mut self) -> Option<&mut F> {
        self.fixtures
            .get_mut(&TypeId::of::<F>())
            .and_then(|e| (e.fixture.as_mut() as &mut dyn Any).downcast_mut::<F>())
    }

    /// Set up every registered fixture, highest priority first.
    ///
    /// # Errors
    ///
    /// Returns the first setup failure after rolling back what was set up.
    pub fn setup_all(&mut self) -> DoubleResult<()> {
        let mut ordered: Vec<(TypeId, i32)> = self
            .fixtures
            .iter()
            .filter(|(_, e)| e.state != FixtureState::SetUp)
            .map(|(id, e)| (*id, e.priority))
            .collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1));

        for (type_id, _) in ordered {
            let Some(entry) = self.fixtures.get_mut(&type_id) else {
                continue;
            };
            tracing::debug!(fixture = entry.fixture.name(), "setting up fixture");
            if let Err(e) = entry.fixture.setup() {
                entry.state = FixtureState::Failed;
                let message = format!("'{}' setup failed: {e}", entry.fixture.name());
                tracing::warn!(%message, "rolling back fixtures");
                // rollback errors are logged; the setup failure is what is returned
                if let Err(rollback) = self.teardown_all() {
                    tracing::warn!(error = %rollback, "rollback teardown failed");
                }
                return Err(DoubleError::fixture(message));
            }
            entry.state = FixtureState::SetUp;
            self.setup_order.push(type_id);
        }
        Ok(())
    }

    /// Tear down set-up fixtures in reverse setup order.
    ///
    /// # Errors
    ///
    /// Every fixture is attempted; the first failure is returned.
    pub fn teardown_all(&mut self) -> DoubleResult<()> {
        let mut first_error = None;
        for type_id in self.setup_order.drain(..).rev() {
            let Some(entry) = self.fixtures.get_mut(&type_id) else {
                continue;
            };
            if entry.state != FixtureState::SetUp {
                continue;
            }
            tracing::debug!(fixture = entry.fixture.name(), "tearing down fixture");
            match entry.fixture.teardown() {
                Ok(()) => entry.state = FixtureState::TornDown,
                Err(e) => {
                    entry.state = FixtureState::Failed;
                    if first_error.is_none() {
                        first_error = Some(DoubleError::fixture(format!(
                            "'{}' teardown failed: {e}",
                            entry.fixture.name()
                        )));
                    }
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Names of registered fixtures
    #[must_use]
    pub fn list(&self) -> Vec<&str> {
        self.fixtures.values().map(|e| e.fixture.name()).collect()
    }
}

/// Session-wide preparation: result directories and a log of the setup
#[derive(Debug)]
pub struct SessionFixture {
    config: HarnessConfig,
    provider: Arc<dyn DriverProvider>,
}

impl SessionFixture {
    /// Create the session fixture
    #[must_use]
    pub fn new(config: HarnessConfig, provider: Arc<dyn DriverProvider>) -> Self {
        Self { config, provider }
    }

    /// The session configuration
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }
}

impl Fixture for SessionFixture {
    fn setup(&mut self) -> DoubleResult<()> {
        self.config.ensure_directories()?;
        tracing::info!(
            backend = %self.provider.backend(),
            browser = %self.config.browser,
            headless = self.config.headless,
            root = %self.config.project_root.display(),
            "test session started"
        );
        Ok(())
    }

    fn teardown(&mut self) -> DoubleResult<()> {
        tracing::info!("test session finished");
        Ok(())
    }

    fn name(&self) -> &str {
        "session"
    }

    fn priority(&self) -> i32 {
        100
    }
}

/// One driver for one test
///
/// Setup builds the driver through the session provider, applies timeouts,
/// maximizes the window and optionally opens a start page. Teardown quits.
#[derive(Debug)]
pub struct DriverFixture {
    config: HarnessConfig,
    provider: Arc<dyn DriverProvider>,
    start_url: Option<String>,
    driver: Option<Box<dyn WebDriver>>,
}

impl DriverFixture {
    /// Create a fixture that opens a blank session
    #[must_use]
    pub fn new(config: HarnessConfig, provider: Arc<dyn DriverProvider>) -> Self {
        Self {
            config,
            provider,
            start_url: None,
            driver: None,
        }
    }

    /// Navigate to `url` right after setup
    #[must_use]
    pub fn with_start_url(mut self, url: impl Into<String>) -> Self {
        self.start_url = Some(url.into());
        self
    }

    /// Open the admin prototype page after setup
    #[must_use]
    pub fn on_admin_page(self) -> Self {
        let url = self.config.admin_url();
        self.with_start_url(url)
    }

    /// Whether a driver is live
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.driver.is_some()
    }

    /// The live driver.
    ///
    /// # Errors
    ///
    /// Fails when called outside setup/teardown.
    pub fn driver_mut(&mut self) -> DoubleResult<&mut dyn WebDriver> {
        match self.driver.as_deref_mut() {
            Some(driver) => Ok(driver),
            None => Err(DoubleError::fixture("driver fixture is not set up")),
        }
    }

    /// Session provider
    #[must_use]
    pub fn provider(&self) -> &dyn DriverProvider {
        self.provider.as_ref()
    }

    /// Save `<screenshot_dir>/<test_name>_failure.png`.
    ///
    /// Returns the path when a screenshot was written; `None` when
    /// screenshots are disabled or no driver is live.
    ///
    /// # Errors
    ///
    /// Propagates driver and I/O failures.
    pub fn capture_failure(&mut self, test_name: &str) -> DoubleResult<Option<PathBuf>> {
        if !(self.config.take_screenshots && self.config.screenshot_on_failure) {
            return Ok(None);
        }
        let Some(driver) = self.driver.as_deref_mut() else {
            return Ok(None);
        };
        let path = self.config.failure_screenshot(test_name);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        if driver.save_screenshot(&path)? {
            tracing::info!(path = %path.display(), "failure screenshot saved");
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }
}

impl Fixture for DriverFixture {
    fn setup(&mut self) -> DoubleResult<()> {
        let options = self.config.driver_options();
        let mut driver = self.provider.new_driver(&options)?;
        driver.implicitly_wait(self.config.implicit_wait())?;
        driver.set_page_load_timeout(self.config.page_load_timeout())?;
        driver.maximize_window()?;
        if let Some(url) = &self.start_url {
            driver.get(url)?;
        }
        self.driver = Some(driver);
        Ok(())
    }

    fn teardown(&mut self) -> DoubleResult<()> {
        match self.driver.take() {
            Some(mut driver) => driver.quit(),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "driver"
    }
}
