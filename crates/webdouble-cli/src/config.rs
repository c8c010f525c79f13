//! CLI configuration

use crate::error::{CliError, CliResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use webdouble::{BackendChoice, BrowserKind, HarnessConfig, LogOptions};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - errors only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - lifecycle logs
    Verbose,
    /// Debug - every mock operation
    Debug,
}

impl Verbosity {
    /// Map `-q` and the `-v` count
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Text logging options for this level
    #[must_use]
    pub const fn log_options(self) -> LogOptions {
        let verbosity = match self {
            Self::Quiet | Self::Normal => 0,
            Self::Verbose => 1,
            Self::Debug => 2,
        };
        LogOptions {
            verbosity,
            quiet: self.is_quiet(),
            json: false,
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stdout().features().colors_supported(),
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Project root holding the prototype pages
    pub root: PathBuf,
    /// Explicit harness config file
    pub config_path: Option<PathBuf>,
    /// Backend override
    pub backend: Option<BackendChoice>,
    /// Browser override
    pub browser: Option<BrowserKind>,
    /// Emit log lines as JSON
    pub log_json: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
            root: PathBuf::from("."),
            config_path: None,
            backend: None,
            browser: None,
            log_json: false,
        }
    }
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set project root
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Set explicit config file
    #[must_use]
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Set backend override
    #[must_use]
    pub const fn with_backend(mut self, backend: Option<BackendChoice>) -> Self {
        self.backend = backend;
        self
    }

    /// Set browser override
    #[must_use]
    pub const fn with_browser(mut self, browser: Option<BrowserKind>) -> Self {
        self.browser = browser;
        self
    }

    /// Set JSON log output
    #[must_use]
    pub const fn with_log_json(mut self, json: bool) -> Self {
        self.log_json = json;
        self
    }

    /// Subscriber options for this run
    #[must_use]
    pub const fn log_options(&self) -> LogOptions {
        let mut options = self.verbosity.log_options();
        options.json = self.log_json;
        options
    }

    /// Resolve the harness configuration: file, then flag overrides
    pub fn harness_config(&self) -> CliResult<HarnessConfig> {
        let mut config = match &self.config_path {
            Some(path) => {
                if !path.is_file() {
                    return Err(CliError::config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                let mut config = HarnessConfig::load(path)?;
                if config.project_root.is_relative() {
                    config.project_root = self.root.join(&config.project_root);
                }
                config
            }
            None => HarnessConfig::discover(&self.root)?,
        };
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(browser) = self.browser {
            config.browser = browser;
        }
        Ok(config)
    }
}
