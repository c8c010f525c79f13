//! Webdouble CLI Library
//!
//! Command-line front end for the webdouble harness: environment detection,
//! configuration dump, project setup checks and a built-in smoke suite.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod output;

pub use commands::{
    BackendArg, BrowserArg, Cli, ColorArg, Commands, DetectArgs, MarkerArg, SmokeArgs, VerifyArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, ProgressReporter, Status};
