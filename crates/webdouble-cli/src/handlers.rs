//! Subcommand implementations

use crate::commands::{DetectArgs, SmokeArgs, VerifyArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, ProgressReporter, Status};
use serde::Serialize;
use webdouble::prelude::*;
use webdouble::{
    resolve_backend, select_provider, Backend, EnvSource, EnvironmentReport, RunOptions,
    DEFAULT_CONFIG_FILE,
};

/// Environment report plus the backend `auto` would resolve to
#[derive(Debug, Clone, Serialize)]
pub struct DetectReport {
    /// Raw detection result
    #[serde(flatten)]
    pub environment: EnvironmentReport,
    /// Backend chosen for the configured choice
    pub backend: Backend,
}

/// Build a detection report for any environment source
pub fn detect_report<E: EnvSource>(
    config: &HarnessConfig,
    detector: &EnvironmentDetector<E>,
) -> DetectReport {
    DetectReport {
        environment: detector.report(),
        backend: resolve_backend(config.backend, detector),
    }
}

/// `webdouble detect`
pub fn detect(config: &CliConfig, args: &DetectArgs) -> CliResult<()> {
    let harness = config.harness_config()?;
    let report = detect_report(&harness, &EnvironmentDetector::from_process());
    tracing::debug!(
        headless = report.environment.headless,
        backend = %report.backend,
        "environment detected"
    );

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            let env = &report.environment;
            println!("CI variable:  {}", env.ci_variable.as_deref().unwrap_or("none"));
            println!(
                "Display:      {}",
                if env.display_available { "available" } else { "unavailable" }
            );
            println!("Headless:     {}", env.headless);
            println!("Backend:      {}", report.backend);
        }
    }
    Ok(())
}

/// `webdouble config`
pub fn show_config(config: &CliConfig) -> CliResult<()> {
    let harness = config.harness_config()?;
    print!("{}", harness.to_yaml()?);
    Ok(())
}

/// One line of the setup check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckItem {
    /// What was checked
    pub label: String,
    /// Whether it is in place
    pub ok: bool,
    /// Whether a miss fails the check
    pub required: bool,
}

impl CheckItem {
    fn new(label: impl Into<String>, ok: bool, required: bool) -> Self {
        Self {
            label: label.into(),
            ok,
            required,
        }
    }
}

/// Inspect the project layout without printing anything
pub fn verify_items(cli: &CliConfig, harness: &HarnessConfig) -> Vec<CheckItem> {
    let root = &harness.project_root;
    let config_file = cli
        .config_path
        .clone()
        .unwrap_or_else(|| cli.root.join(DEFAULT_CONFIG_FILE));

    let mut items = vec![
        CheckItem::new(
            format!("{} - admin prototype page", harness.admin_page),
            root.join(&harness.admin_page).is_file(),
            true,
        ),
        CheckItem::new(
            format!("{} - harness config", config_file.display()),
            config_file.is_file(),
            false,
        ),
    ];
    for (dir, what) in [
        (harness.results_path(), "results directory"),
        (harness.screenshot_path(), "screenshot directory"),
        (harness.test_data_path(), "test data directory"),
    ] {
        items.push(CheckItem::new(
            format!("{} - {what}", dir.display()),
            dir.is_dir(),
            false,
        ));
    }
    items
}

/// `webdouble verify`
pub fn verify(config: &CliConfig, args: &VerifyArgs, reporter: &ProgressReporter) -> CliResult<()> {
    let harness = config.harness_config()?;
    tracing::info!(root = %harness.project_root.display(), "verifying project setup");
    if args.create_dirs {
        harness.ensure_directories()?;
        reporter.info("output directories created");
    }

    reporter.header("Project Files Check");
    let items = verify_items(config, &harness);
    for item in &items {
        if !item.ok {
            tracing::debug!(item = %item.label, required = item.required, "check missing");
        }
        reporter.check(item);
    }

    let detector = EnvironmentDetector::from_process();
    let backend = resolve_backend(harness.backend, &detector);
    tracing::info!(%backend, browser = %harness.browser, "resolved backend");
    if backend == Backend::Chromium {
        reporter.header("Browser Check");
        match select_provider(&harness, &detector)
            .and_then(|provider| provider.driver_executable(harness.browser))
        {
            Ok(path) => reporter.status(
                Status::Pass,
                &format!("{} - {}", harness.browser, path.display()),
            ),
            Err(e) => {
                tracing::warn!(error = %e, "browser executable not found");
                reporter.status(Status::Warn, &e.to_string());
            }
        }
    }

    let missing = items.iter().filter(|i| i.required && !i.ok).count();
    tracing::info!(checked = items.len(), missing, "verification finished");
    if missing > 0 {
        return Err(CliError::Verification { missing });
    }
    reporter.info("All required project files found");
    Ok(())
}

/// Sanity cases that hold on any backend serving the admin page
pub fn smoke_suite() -> TestSuite {
    TestSuite::new("smoke")
        .with_test(
            TestCase::new("test_admin_page_loads", |ctx| {
                let url = ctx.driver.current_url()?;
                let page = &ctx.config.admin_page;
                ensure!(url.ends_with(page.as_str()), "expected {page}, got {url}");
                Ok(())
            })
            .with_marker(Marker::Smoke)
            .on_admin_page(),
        )
        .with_test(
            TestCase::new("test_element_identity", |ctx| {
                let locator = Locator::id("addUserBtn");
                let first = ctx.driver.find_element(&locator)?;
                let second = ctx.driver.find_element(&locator)?;
                ensure!(
                    first.id() == second.id(),
                    "{} and {} differ",
                    first.id(),
                    second.id()
                );
                Ok(())
            })
            .with_marker(Marker::Smoke)
            .with_marker(Marker::Regression)
            .on_admin_page(),
        )
        .with_test(
            TestCase::new("test_form_entry", |ctx| {
                let field = Locator::id("userName");
                let mut pd = PageDriver::from_context(ctx);
                pd.fill(&field, "Smoke User")?;
                let value = pd.value_of(&field)?;
                ensure!(value == "Smoke User", "field holds {value:?}");
                Ok(())
            })
            .with_marker(Marker::UserManagement)
            .on_admin_page(),
        )
        .with_test(
            TestCase::new("test_role_choice", |ctx| {
                let mut pd = PageDriver::from_context(ctx);
                pd.choose(&Locator::id("userRole"), &SelectBy::Index(0))
            })
            .with_marker(Marker::RoleManagement)
            .on_admin_page(),
        )
        .with_test(
            TestCase::new("test_scripts_run", |ctx| {
                ctx.driver.execute_script("return document.title;", &[])?;
                Ok(())
            })
            .with_marker(Marker::Regression),
        )
}

/// `webdouble smoke`
pub fn smoke(config: &CliConfig, args: &SmokeArgs, reporter: &ProgressReporter) -> CliResult<()> {
    let harness = config.harness_config()?.with_echo_trace(args.trace);
    let session = TestSession::start(harness, &EnvironmentDetector::from_process())?;
    let backend = session.provider().backend();
    tracing::info!(
        %backend,
        marker = ?args.marker,
        fail_fast = args.fail_fast,
        "starting smoke run"
    );
    reporter.info(&format!("backend: {backend}"));

    let mut options = RunOptions::new();
    if let Some(marker) = args.marker {
        options = options.with_marker(marker.into());
    }
    if args.fail_fast {
        options = options.with_fail_fast();
    }

    reporter.header("Smoke Suite");
    let results = session.run_suite(&smoke_suite(), &options);
    reporter.suite(&results);
    tracing::info!(
        passed = results.passed_count(),
        failed = results.failed_count(),
        skipped = results.skipped,
        "smoke run finished"
    );
    session.finish()?;

    if results.all_passed() {
        Ok(())
    } else {
        Err(CliError::SmokeFailed {
            failed: results.failed_count(),
            total: results.total(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;
    use webdouble::{MapEnv, MockProvider};

    fn mock_session(dir: &TempDir) -> TestSession {
        let harness = HarnessConfig::default()
            .with_project_root(dir.path())
            .with_echo_trace(false);
        TestSession::with_provider(harness, Arc::new(MockProvider::with_sink(TraceSink::silent())))
            .unwrap()
    }

    mod detect_tests {
        use super::*;

        #[test]
        fn test_ci_report_resolves_mock() {
            let detector = EnvironmentDetector::new(MapEnv::new().with("CI", "true"));
            let report = detect_report(&HarnessConfig::default(), &detector);
            assert!(report.environment.headless);
            assert_eq!(report.environment.ci_variable.as_deref(), Some("CI"));
            assert_eq!(report.backend, Backend::Mock);
        }

        #[test]
        fn test_report_json_is_flat() {
            let detector = EnvironmentDetector::new(MapEnv::new());
            let report = detect_report(&HarnessConfig::default(), &detector);
            let json = serde_json::to_value(&report).unwrap();
            assert_eq!(json["headless"], true);
            assert_eq!(json["backend"], "mock");
        }
    }

    mod verify_tests {
        use super::*;

        #[test]
        fn test_missing_admin_page_is_required() {
            let dir = TempDir::new().unwrap();
            let cli = CliConfig::new().with_root(dir.path());
            let harness = cli.harness_config().unwrap();
            let items = verify_items(&cli, &harness);
            let admin = &items[0];
            assert!(admin.required);
            assert!(!admin.ok);
            assert!(items[1..].iter().all(|i| !i.required));
        }

        #[test]
        fn test_complete_layout_passes() {
            let dir = TempDir::new().unwrap();
            std::fs::write(dir.path().join("admin-prototype.html"), "<html></html>").unwrap();
            std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "echo_trace: false\n").unwrap();
            let cli = CliConfig::new().with_root(dir.path());
            let harness = cli.harness_config().unwrap();
            harness.ensure_directories().unwrap();
            assert!(verify_items(&cli, &harness).iter().all(|i| i.ok));
        }
    }

    mod smoke_tests {
        use super::*;

        #[test]
        fn test_smoke_suite_passes_on_mock() {
            let dir = TempDir::new().unwrap();
            let session = mock_session(&dir);
            let results = session.run_suite(&smoke_suite(), &RunOptions::new());
            assert!(results.all_passed(), "{:?}", results.failures());
            assert_eq!(results.total(), smoke_suite().test_count());
            session.finish().unwrap();
        }

        #[test]
        fn test_marker_filter_skips_others() {
            let dir = TempDir::new().unwrap();
            let session = mock_session(&dir);
            let options = RunOptions::new().with_marker(Marker::RoleManagement);
            let results = session.run_suite(&smoke_suite(), &options);
            assert_eq!(results.total(), 1);
            assert_eq!(results.skipped, smoke_suite().test_count() - 1);
        }
    }
}
