//! Webdouble CLI: environment detection and smoke runs for admin prototypes
//!
//! ## Usage
//!
//! ```bash
//! webdouble detect --format json      # Would this run headless?
//! webdouble config                    # Resolved harness config as YAML
//! webdouble verify --create-dirs      # Check project files
//! webdouble smoke --marker smoke      # Run the built-in smoke suite
//! ```

use clap::Parser;
use std::process::ExitCode;
use webdouble_cli::{
    handlers, Cli, CliConfig, CliResult, ColorChoice, Commands, OutputFormat, ProgressReporter,
    Verbosity,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    webdouble::logging::init(config.log_options())?;

    let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    match cli.command {
        Commands::Detect(args) => handlers::detect(&config, &args),
        Commands::Config => handlers::show_config(&config),
        Commands::Verify(args) => handlers::verify(&config, &args, &reporter),
        Commands::Smoke(args) => handlers::smoke(&config, &args, &reporter),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(ColorChoice::from(cli.color))
        .with_root(&cli.root)
        .with_config_path(cli.config.clone())
        .with_backend(cli.backend.map(Into::into))
        .with_browser(cli.browser.map(Into::into))
        .with_log_json(cli.log_format == OutputFormat::Json)
}
