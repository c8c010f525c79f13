//! Test session and runner.
//!
//! A [`TestSession`] picks the driver provider once, sets up the session
//! fixture and runs cases, each inside its own [`DriverFixture`].

use crate::config::HarnessConfig;
use crate::driver::WebDriver;
use crate::env::{EnvSource, EnvironmentDetector};
use crate::fixture::{DriverFixture, Fixture, FixtureManager, SessionFixture};
use crate::provider::{select_provider, DriverProvider};
use crate::result::DoubleResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Test category used for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    /// User management tests
    UserManagement,
    /// Role management tests
    RoleManagement,
    /// Settings tests
    Settings,
    /// Quick sanity tests
    Smoke,
    /// Regression tests
    Regression,
    /// Long-running tests
    Slow,
}

impl Marker {
    /// Every marker
    pub const ALL: [Self; 6] = [
        Self::UserManagement,
        Self::RoleManagement,
        Self::Settings,
        Self::Smoke,
        Self::Regression,
        Self::Slow,
    ];

    /// Marker name as written on the command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserManagement => "user_management",
            Self::RoleManagement => "role_management",
            Self::Settings => "settings",
            Self::Smoke => "smoke",
            Self::Regression => "regression",
            Self::Slow => "slow",
        }
    }

    /// Parse a marker name
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a test body gets to work with
pub struct TestContext<'a> {
    /// Live driver for this case
    pub driver: &'a mut dyn WebDriver,
    /// Session provider
    pub provider: &'a dyn DriverProvider,
    /// Session configuration
    pub config: &'a HarnessConfig,
}

impl fmt::Debug for TestContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("driver", &self.driver.name())
            .field("backend", &self.provider.backend())
            .finish_non_exhaustive()
    }
}

type TestBody = Arc<dyn Fn(&mut TestContext<'_>) -> DoubleResult<()> + Send + Sync>;

/// A single test case
#[derive(Clone)]
pub struct TestCase {
    /// Test name
    pub name: String,
    /// Categories
    pub markers: Vec<Marker>,
    /// Declared timeout; informational
    pub timeout: Duration,
    /// Open the admin page before the body runs
    pub on_admin_page: bool,
    body: TestBody,
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("markers", &self.markers)
            .field("timeout", &self.timeout)
            .field("on_admin_page", &self.on_admin_page)
            .finish_non_exhaustive()
    }
}

impl TestCase {
    /// Create a new test case
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut TestContext<'_>) -> DoubleResult<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            markers: Vec::new(),
            timeout: Duration::from_secs(30),
            on_admin_page: false,
            body: Arc::new(body),
        }
    }

    /// Add a marker
    #[must_use]
    pub fn with_marker(mut self, marker: Marker) -> Self {
        if !self.markers.contains(&marker) {
            self.markers.push(marker);
        }
        self
    }

    /// Set timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Start the case on the admin prototype page
    #[must_use]
    pub const fn on_admin_page(mut self) -> Self {
        self.on_admin_page = true;
        self
    }

    /// Whether the case carries `marker`
    #[must_use]
    pub fn has_marker(&self, marker: Marker) -> bool {
        self.markers.contains(&marker)
    }
}

/// A named list of cases
#[derive(Debug, Clone)]
pub struct TestSuite {
    /// Suite name
    pub name: String,
    /// Cases in order
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    /// Create an empty suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: Vec::new(),
        }
    }

    /// Add a case
    pub fn add_test(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    /// Builder form of [`Self::add_test`]
    #[must_use]
    pub fn with_test(mut self, test: TestCase) -> Self {
        self.add_test(test);
        self
    }

    /// Number of cases
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.tests.len()
    }
}

/// Result of running a single test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Test name
    pub name: String,
    /// Whether test passed
    pub passed: bool,
    /// Error message if failed
    pub error: Option<String>,
    /// Failure screenshot, if one was taken
    pub screenshot: Option<PathBuf>,
    /// Test duration
    pub duration: Duration,
}

impl TestResult {
    /// Create a passing test result
    #[must_use]
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            error: None,
            screenshot: None,
            duration: Duration::ZERO,
        }
    }

    /// Create a failing test result
    #[must_use]
    pub fn fail(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            error: Some(error.into()),
            screenshot: None,
            duration: Duration::ZERO,
        }
    }

    /// Set duration
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Attach a screenshot path
    #[must_use]
    pub fn with_screenshot(mut self, path: Option<PathBuf>) -> Self {
        self.screenshot = path;
        self
    }
}

/// Results from running a suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResults {
    /// Suite name
    pub suite_name: String,
    /// Individual results, in run order
    pub results: Vec<TestResult>,
    /// Cases filtered out by marker
    pub skipped: usize,
    /// Total duration
    pub duration: Duration,
}

impl SuiteResults {
    /// Check if all tests passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Count passed tests
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Count failed tests
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    /// Get total test count
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Get failed tests
    #[must_use]
    pub fn failures(&self) -> Vec<&TestResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }
}

/// Options for [`TestSession::run_suite`]
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Only run cases carrying this marker
    pub marker: Option<Marker>,
    /// Stop at the first failure
    pub fail_fast: bool,
}

impl RunOptions {
    /// Create default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by marker
    #[must_use]
    pub const fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = Some(marker);
        self
    }

    /// Enable fail-fast mode
    #[must_use]
    pub const fn with_fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }
}

/// One run of the harness
#[derive(Debug)]
pub struct TestSession {
    config: HarnessConfig,
    provider: Arc<dyn DriverProvider>,
    fixtures: FixtureManager,
}

impl TestSession {
    /// Pick the provider for this environment and set up the session.
    ///
    /// # Errors
    ///
    /// Fails when the requested backend is unavailable or the session
    /// fixture cannot create its directories.
    pub fn start<E: EnvSource>(
        config: HarnessConfig,
        detector: &EnvironmentDetector<E>,
    ) -> DoubleResult<Self> {
        let provider = select_provider(&config, detector)?;
        Self::with_provider(config, provider)
    }

    /// Start a session on an explicit provider.
    ///
    /// # Errors
    ///
    /// Fails when the session fixture cannot be set up.
    pub fn with_provider(
        config: HarnessConfig,
        provider: Arc<dyn DriverProvider>,
    ) -> DoubleResult<Self> {
        let mut fixtures = FixtureManager::new();
        fixtures.register(SessionFixture::new(config.clone(), Arc::clone(&provider)));
        fixtures.setup_all()?;
        Ok(Self {
            config,
            provider,
            fixtures,
        })
    }

    /// Session configuration
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Session provider
    #[must_use]
    pub fn provider(&self) -> Arc<dyn DriverProvider> {
        Arc::clone(&self.provider)
    }

    /// Run one case with a fresh driver
    ///
    /// The driver is always quit; a failing case gets a screenshot first.
    pub fn run_case(&self, case: &TestCase) -> TestResult {
        let start = Instant::now();
        let mut fixture = DriverFixture::new(self.config.clone(), Arc::clone(&self.provider));
        if case.on_admin_page {
            fixture = fixture.on_admin_page();
        }
        tracing::info!(test = %case.name, "running test");

        let outcome = fixture.setup().and_then(|()| {
            let config = &self.config;
            let provider = self.provider.as_ref();
            let driver = fixture.driver_mut()?;
            let mut ctx = TestContext {
                driver,
                provider,
                config,
            };
            (case.body)(&mut ctx)
        });

        let mut result = match outcome {
            Ok(()) => TestResult::pass(&case.name),
            Err(e) => {
                let screenshot = fixture.capture_failure(&case.name).unwrap_or_else(|err| {
                    tracing::warn!(error = %err, "failure screenshot not saved");
                    None
                });
                TestResult::fail(&case.name, e.to_string()).with_screenshot(screenshot)
            }
        };
        if let Err(e) = fixture.teardown() {
            tracing::warn!(test = %case.name, error = %e, "driver teardown failed");
            if result.passed {
                result = TestResult::fail(&case.name, e.to_string());
            }
        }

        let result = result.with_duration(start.elapsed());
        if result.passed {
            tracing::info!(test = %case.name, "passed");
        } else {
            tracing::warn!(test = %case.name, error = ?result.error, "failed");
        }
        result
    }

    /// Run a suite honouring the marker filter and fail-fast
    #[must_use]
    pub fn run_suite(&self, suite: &TestSuite, options: &RunOptions) -> SuiteResults {
        let start = Instant::now();
        let mut results = Vec::new();
        let mut skipped = 0;
        for case in &suite.tests {
            if options.marker.is_some_and(|m| !case.has_marker(m)) {
                skipped += 1;
                continue;
            }
            let result = self.run_case(case);
            let failed = !result.passed;
            results.push(result);
            if failed && options.fail_fast {
                break;
            }
        }
        SuiteResults {
            suite_name: suite.name.clone(),
            results,
            skipped,
            duration: start.elapsed(),
        }
    }

    /// Tear down the session fixture.
    ///
    /// # Errors
    ///
    /// Propagates teardown failures.
    pub fn finish(mut self) -> DoubleResult<()> {
        self.fixtures.teardown_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensure;
    use crate::locator::Locator;
    use crate::provider::MockProvider;
    use crate::trace::TraceSink;
    use tempfile::TempDir;

    fn session(dir: &TempDir, sink: &TraceSink) -> TestSession {
        let config = HarnessConfig::default()
            .with_project_root(dir.path())
            .with_echo_trace(false);
        TestSession::with_provider(config, Arc::new(MockProvider::with_sink(sink.clone()))).unwrap()
    }

    fn passing(name: &str) -> TestCase {
        TestCase::new(name, |ctx| {
            ctx.driver.find_element(&Locator::id("addUserBtn"))?.click()
        })
    }

    fn failing(name: &str) -> TestCase {
        TestCase::new(name, |ctx| {
            let title = ctx.driver.title()?;
            ensure!(title == "Admin", "unexpected title {title}");
            Ok(())
        })
    }

    mod marker_tests {
        use super::*;

        #[test]
        fn test_parse_names() {
            for marker in Marker::ALL {
                assert_eq!(Marker::parse(marker.as_str()), Some(marker));
            }
            assert_eq!(Marker::parse("flaky"), None);
        }

        #[test]
        fn test_duplicate_marker_ignored() {
            let case = passing("t")
                .with_marker(Marker::Smoke)
                .with_marker(Marker::Smoke);
            assert_eq!(case.markers, [Marker::Smoke]);
        }
    }

    mod run_tests {
        use super::*;

        #[test]
        fn test_passing_case_quits_driver() {
            let dir = TempDir::new().unwrap();
            let sink = TraceSink::silent();
            let session = session(&dir, &sink);
            let result = session.run_case(&passing("test_add_user_button"));
            assert!(result.passed);
            assert_eq!(result.screenshot, None);
            assert_eq!(sink.count("quit"), 1);
            assert_eq!(sink.count("click"), 1);
        }

        #[test]
        fn test_failing_case_takes_screenshot_and_quits() {
            let dir = TempDir::new().unwrap();
            let sink = TraceSink::silent();
            let session = session(&dir, &sink);
            let result = session.run_case(&failing("test_title"));
            assert!(!result.passed);
            assert!(result.error.unwrap().contains("unexpected title Mock Browser"));
            assert_eq!(
                result.screenshot,
                Some(dir.path().join("test_results/screenshots/test_title_failure.png"))
            );
            let ops: Vec<String> = sink.events().into_iter().map(|e| e.op).collect();
            let shot = ops.iter().position(|op| op == "save_screenshot").unwrap();
            let quit = ops.iter().position(|op| op == "quit").unwrap();
            assert!(shot < quit);
        }

        #[test]
        fn test_admin_page_case_starts_on_admin_url() {
            let dir = TempDir::new().unwrap();
            let sink = TraceSink::silent();
            let session = session(&dir, &sink);
            let case = TestCase::new("test_nav", |ctx| {
                let url = ctx.driver.current_url()?;
                ensure!(url.ends_with("/admin-prototype.html"), "at {url}");
                Ok(())
            })
            .on_admin_page();
            assert!(session.run_case(&case).passed);
        }

        #[test]
        fn test_marker_filter_and_fail_fast() {
            let dir = TempDir::new().unwrap();
            let sink = TraceSink::silent();
            let session = session(&dir, &sink);
            let suite = TestSuite::new("admin")
                .with_test(passing("a").with_marker(Marker::Smoke))
                .with_test(failing("b").with_marker(Marker::Smoke))
                .with_test(passing("c").with_marker(Marker::Smoke))
                .with_test(passing("d").with_marker(Marker::Slow));

            let all = session.run_suite(&suite, &RunOptions::new());
            assert_eq!(all.total(), 4);
            assert_eq!(all.failed_count(), 1);

            let smoke = session.run_suite(&suite, &RunOptions::new().with_marker(Marker::Smoke));
            assert_eq!(smoke.total(), 3);
            assert_eq!(smoke.skipped, 1);

            let fast = session.run_suite(&suite, &RunOptions::new().with_fail_fast());
            assert_eq!(fast.total(), 2);
            assert_eq!(fast.failures()[0].name, "b");
        }

        #[test]
        fn test_finish_tears_down_session() {
            let dir = TempDir::new().unwrap();
            let session = session(&dir, &TraceSink::silent());
            session.finish().unwrap();
        }
    }
}
