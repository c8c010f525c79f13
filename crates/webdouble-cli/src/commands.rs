//! CLI command definitions

use crate::config::ColorChoice;
use crate::output::OutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use webdouble::{BackendChoice, BrowserKind, Marker};

/// webdouble: mock browser driver and test harness for admin prototypes
#[derive(Parser, Debug)]
#[command(name = "webdouble")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format on stderr
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: OutputFormat,

    /// Harness config file (defaults to webdouble.yaml under --root)
    #[arg(long, global = true, env = "WEBDOUBLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Project root holding the prototype pages
    #[arg(long, default_value = ".", global = true, env = "WEBDOUBLE_ROOT")]
    pub root: PathBuf,

    /// Driver backend
    #[arg(long, global = true, env = "WEBDOUBLE_BACKEND")]
    pub backend: Option<BackendArg>,

    /// Browser family for the real backend
    #[arg(long, global = true, env = "WEBDOUBLE_BROWSER")]
    pub browser: Option<BrowserArg>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report whether this environment counts as headless
    Detect(DetectArgs),

    /// Print the resolved harness configuration as YAML
    Config,

    /// Check that the project files and directories are in place
    Verify(VerifyArgs),

    /// Run the built-in smoke suite through a test session
    Smoke(SmokeArgs),
}

/// Arguments for the detect command
#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the verify command
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Create missing output directories instead of reporting them
    #[arg(long)]
    pub create_dirs: bool,
}

/// Arguments for the smoke command
#[derive(Parser, Debug)]
pub struct SmokeArgs {
    /// Only run cases carrying this marker
    #[arg(short, long)]
    pub marker: Option<MarkerArg>,

    /// Stop after the first failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Echo mock trace lines to stdout
    #[arg(long)]
    pub trace: bool,
}

/// Color argument
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum ColorArg {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Always => Self::Always,
            ColorArg::Auto => Self::Auto,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Backend argument
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum BackendArg {
    /// Mock when headless, real browser otherwise
    Auto,
    /// Always mock
    Mock,
    /// Always a real browser
    Real,
}

impl From<BackendArg> for BackendChoice {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => Self::Auto,
            BackendArg::Mock => Self::Mock,
            BackendArg::Real => Self::Real,
        }
    }
}

/// Browser argument
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum BrowserArg {
    /// Microsoft Edge
    Edge,
    /// Google Chrome or Chromium
    Chrome,
}

impl From<BrowserArg> for BrowserKind {
    fn from(arg: BrowserArg) -> Self {
        match arg {
            BrowserArg::Edge => Self::Edge,
            BrowserArg::Chrome => Self::Chrome,
        }
    }
}

/// Marker argument
#[derive(ValueEnum, Debug, Clone, Copy)]
#[value(rename_all = "snake_case")]
pub enum MarkerArg {
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

impl From<MarkerArg> for Marker {
    fn from(arg: MarkerArg) -> Self {
        match arg {
            MarkerArg::UserManagement => Self::UserManagement,
            MarkerArg::RoleManagement => Self::RoleManagement,
            MarkerArg::Settings => Self::Settings,
            MarkerArg::Smoke => Self::Smoke,
            MarkerArg::Regression => Self::Regression,
            MarkerArg::Slow => Self::Slow,
        }
    }
}
