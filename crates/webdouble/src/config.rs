//! Harness configuration.
//!
//! Loaded from YAML (`webdouble.yaml`); every field has a default so an
//! empty file is valid.

use crate::result::{DoubleError, DoubleResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file name looked up in the project root
pub const DEFAULT_CONFIG_FILE: &str = "webdouble.yaml";

/// Browser family a real backend should launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    /// Microsoft Edge (Chromium)
    #[default]
    Edge,
    /// Google Chrome / Chromium
    Chrome,
}

impl BrowserKind {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Edge => "edge",
            Self::Chrome => "chrome",
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which driver backend a session should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    /// Mock when the environment is headless, real otherwise
    #[default]
    Auto,
    /// Always the mock
    Mock,
    /// Always a real browser
    Real,
}

/// Options handed to a provider when constructing a driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverOptions {
    /// Browser family
    pub browser: BrowserKind,
    /// Run without a visible window
    pub headless: bool,
    /// Command-line arguments for the browser
    pub arguments: Vec<String>,
    /// Explicit browser executable
    pub executable: Option<PathBuf>,
    /// Window size used when headless
    pub window_size: (u32, u32),
    /// Echo mock trace lines to stdout
    pub echo_trace: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        HarnessConfig::default().driver_options()
    }
}

/// Test harness settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Directory holding the HTML prototype pages
    pub project_root: PathBuf,
    /// Browser family
    pub browser: BrowserKind,
    /// Run the real browser without a window
    pub headless: bool,
    /// Backend selection
    pub backend: BackendChoice,
    /// Seconds to wait for elements
    pub implicit_wait_secs: u64,
    /// Seconds to wait for page load
    pub page_load_timeout_secs: u64,
    /// Pause between page actions
    pub slow_motion: bool,
    /// Pause length
    pub slow_motion_delay_ms: u64,
    /// Master switch for screenshots
    pub take_screenshots: bool,
    /// Capture a screenshot when a test fails
    pub screenshot_on_failure: bool,
    /// Where screenshots go (relative to `project_root`)
    pub screenshot_dir: PathBuf,
    /// Where results go (relative to `project_root`)
    pub results_dir: PathBuf,
    /// Where CSV test data lives (relative to `project_root`)
    pub test_data_dir: PathBuf,
    /// Admin prototype page file name
    pub admin_page: String,
    /// Explicit browser executable
    pub executable: Option<PathBuf>,
    /// Echo mock trace lines to stdout
    pub echo_trace: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            browser: BrowserKind::Edge,
            headless: false,
            backend: BackendChoice::Auto,
            implicit_wait_secs: 10,
            page_load_timeout_secs: 30,
            slow_motion: false,
            slow_motion_delay_ms: 500,
            take_screenshots: true,
            screenshot_on_failure: true,
            screenshot_dir: PathBuf::from("test_results/screenshots"),
            results_dir: PathBuf::from("test_results"),
            test_data_dir: PathBuf::from("test_data"),
            admin_page: "admin-prototype.html".to_string(),
            executable: None,
            echo_trace: true,
        }
    }
}

impl HarnessConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse YAML text
    pub fn from_yaml_str(yaml: &str) -> DoubleResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn load(path: &Path) -> DoubleResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DoubleError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Load `webdouble.yaml` from `root` if present, defaults otherwise
    pub fn discover(root: &Path) -> DoubleResult<Self> {
        let path = root.join(DEFAULT_CONFIG_FILE);
        let mut config = if path.is_file() {
            Self::load(&path)?
        } else {
            Self::default()
        };
        if config.project_root.is_relative() {
            config.project_root = root.join(&config.project_root);
        }
        Ok(config)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> DoubleResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Reject settings no run can work with
    pub fn validate(&self) -> DoubleResult<()> {
        if self.admin_page.trim().is_empty() {
            return Err(DoubleError::config("admin_page must not be empty"));
        }
        if self.page_load_timeout_secs == 0 {
            return Err(DoubleError::config(
                "page_load_timeout_secs must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Set project root
    #[must_use]
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    /// Set backend choice
    #[must_use]
    pub const fn with_backend(mut self, backend: BackendChoice) -> Self {
        self.backend = backend;
        self
    }

    /// Set browser family
    #[must_use]
    pub const fn with_browser(mut self, browser: BrowserKind) -> Self {
        self.browser = browser;
        self
    }

    /// Enable or disable slow motion
    #[must_use]
    pub const fn with_slow_motion(mut self, enabled: bool, delay_ms: u64) -> Self {
        self.slow_motion = enabled;
        self.slow_motion_delay_ms = delay_ms;
        self
    }

    /// Enable or disable trace echo
    #[must_use]
    pub const fn with_echo_trace(mut self, echo: bool) -> Self {
        self.echo_trace = echo;
        self
    }

    /// Implicit wait as a duration
    #[must_use]
    pub const fn implicit_wait(&self) -> Duration {
        Duration::from_secs(self.implicit_wait_secs)
    }

    /// Page load timeout as a duration
    #[must_use]
    pub const fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    /// Slow-motion pacing
    #[must_use]
    pub const fn slow_motion(&self) -> SlowMotion {
        SlowMotion {
            enabled: self.slow_motion,
            delay: Duration::from_millis(self.slow_motion_delay_ms),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    /// Absolute-or-root-relative screenshot directory
    #[must_use]
    pub fn screenshot_path(&self) -> PathBuf {
        self.resolve(&self.screenshot_dir)
    }

    /// Absolute-or-root-relative results directory
    #[must_use]
    pub fn results_path(&self) -> PathBuf {
        self.resolve(&self.results_dir)
    }

    /// Absolute-or-root-relative test data directory
    #[must_use]
    pub fn test_data_path(&self) -> PathBuf {
        self.resolve(&self.test_data_dir)
    }

    /// Where a failing test's screenshot goes
    #[must_use]
    pub fn failure_screenshot(&self, test_name: &str) -> PathBuf {
        self.screenshot_path()
            .join(format!("{test_name}_failure.png"))
    }

    /// `file://` URL of a page in the project root
    #[must_use]
    pub fn page_url(&self, file_name: &str) -> String {
        let path = self.project_root.join(file_name);
        let absolute = std::path::absolute(&path).unwrap_or(path);
        let text = absolute.to_string_lossy().replace('\\', "/");
        if text.starts_with('/') {
            format!("file://{text}")
        } else {
            format!("file:///{text}")
        }
    }

    /// URL of the admin prototype page
    #[must_use]
    pub fn admin_url(&self) -> String {
        self.page_url(&self.admin_page)
    }

    /// Create screenshot, results and test data directories
    pub fn ensure_directories(&self) -> DoubleResult<()> {
        for dir in [
            self.screenshot_path(),
            self.results_path(),
            self.test_data_path(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Driver construction options for this configuration
    #[must_use]
    pub fn driver_options(&self) -> DriverOptions {
        let mut arguments = Vec::new();
        if self.headless {
            arguments.push("--headless".to_string());
        }
        arguments.extend(
            [
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--disable-web-security",
                "--allow-running-insecure-content",
            ]
            .map(String::from),
        );
        if self.browser == BrowserKind::Edge {
            arguments.push("--disable-features=VizDisplayCompositor".to_string());
        }
        DriverOptions {
            browser: self.browser,
            headless: self.headless,
            arguments,
            executable: self.executable.clone(),
            window_size: (1920, 1080),
            echo_trace: self.echo_trace,
        }
    }
}

/// Optional pause between page actions, for watching a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlowMotion {
    /// Whether pauses happen at all
    pub enabled: bool,
    /// Default pause
    pub delay: Duration,
}

impl SlowMotion {
    /// No pauses
    pub const OFF: Self = Self {
        enabled: false,
        delay: Duration::ZERO,
    };

    /// Sleep for `delay` (or the override) when enabled
    pub fn pause(&self, override_delay: Option<Duration>) {
        if self.enabled {
            std::thread::sleep(override_delay.unwrap_or(self.delay));
        }
    }
}
