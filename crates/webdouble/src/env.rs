//! Headless / CI environment detection.
//!
//! Decides once per session whether a display is available. Absent
//! variables count as "not set"; detection never fails.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Variables whose non-empty presence marks a continuous-integration run
pub const CI_INDICATOR_VARS: &[&str] = &[
    "CI",
    "CONTINUOUS_INTEGRATION",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "TRAVIS",
    "CIRCLECI",
    "JENKINS_URL",
    "CODESPACES",
];

/// X11 display-server variable; its absence means no windowing environment
pub const DISPLAY_VAR: &str = "DISPLAY";

/// Source of environment variables
pub trait EnvSource {
    /// Value of `name`, or `None` when unset
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var_os(name).map(|v| v.to_string_lossy().into_owned())
    }
}

/// Fixed in-memory environment
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    /// Create an empty environment
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSource for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Outcome of an environment inspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentReport {
    /// First CI indicator found set and non-empty
    pub ci_variable: Option<String>,
    /// Whether `DISPLAY` is set and non-empty
    pub display_available: bool,
    /// Final verdict
    pub headless: bool,
}

/// Decides mock-vs-real from environment variables
#[derive(Debug, Clone, Default)]
pub struct EnvironmentDetector<E = ProcessEnv> {
    source: E,
}

impl EnvironmentDetector<ProcessEnv> {
    /// Detector over the process environment
    #[must_use]
    pub fn from_process() -> Self {
        Self { source: ProcessEnv }
    }
}

impl<E: EnvSource> EnvironmentDetector<E> {
    /// Detector over an arbitrary source
    #[must_use]
    pub fn new(source: E) -> Self {
        Self { source }
    }

    fn is_set(&self, name: &str) -> bool {
        self.source.var(name).is_some_and(|v| !v.is_empty())
    }

    /// True when a CI indicator is set or no display server is available
    #[must_use]
    pub fn is_headless(&self) -> bool {
        self.report().headless
    }

    /// Detailed inspection result
    #[must_use]
    pub fn report(&self) -> EnvironmentReport {
        let ci_variable = CI_INDICATOR_VARS
            .iter()
            .find(|name| self.is_set(name))
            .map(|name| (*name).to_string());
        let display_available = self.is_set(DISPLAY_VAR);

        EnvironmentReport {
            headless: ci_variable.is_some() || !display_available,
            ci_variable,
            display_available,
        }
    }
}
