//! Terminal output for setup checks and suite runs

use crate::handlers::CheckItem;
use console::{style, StyledObject, Term};
use serde::{Deserialize, Serialize};
use webdouble::{SuiteResults, TestResult};

/// Output format for reports and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Line prefix shown before a status message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Check or test passed
    Pass,
    /// Required check missing or test failed
    Fail,
    /// Optional check missing
    Warn,
    /// Plain information
    Info,
}

impl Status {
    /// Four-letter tag
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Warn => "WARN",
            Self::Info => "INFO",
        }
    }

    fn styled(self) -> StyledObject<&'static str> {
        let tag = style(self.tag()).bold();
        match self {
            Self::Pass => tag.green(),
            Self::Fail => tag.red(),
            Self::Warn => tag.yellow(),
            Self::Info => tag.blue(),
        }
    }

    /// Status of a setup check
    #[must_use]
    pub const fn of_check(item: &CheckItem) -> Self {
        match (item.ok, item.required) {
            (true, _) => Self::Pass,
            (false, true) => Self::Fail,
            (false, false) => Self::Warn,
        }
    }
}

/// Render one check as its message text
#[must_use]
pub fn check_line(item: &CheckItem) -> String {
    if item.ok {
        item.label.clone()
    } else {
        format!("{} (missing)", item.label)
    }
}

/// Render one test result as its message text
#[must_use]
pub fn result_line(result: &TestResult) -> String {
    let timing = format!("{} ({:.2}s)", result.name, result.duration.as_secs_f64());
    match &result.error {
        Some(error) if !result.passed => format!("{timing}: {error}"),
        _ => timing,
    }
}

/// Render the suite tally
#[must_use]
pub fn summary_line(results: &SuiteResults) -> String {
    let verdict = if results.all_passed() { "PASSED" } else { "FAILED" };
    format!(
        "{verdict} {} tests in {:.2}s ({} passed, {} failed, {} skipped)",
        results.total() + results.skipped,
        results.duration.as_secs_f64(),
        results.passed_count(),
        results.failed_count(),
        results.skipped,
    )
}

/// Writes status lines to stdout
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode: only failures and failing summaries are shown
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            use_color,
            quiet,
        }
    }

    fn write(&self, line: &str) {
        let _ = self.term.write_line(line);
    }

    /// One tagged line; failures survive quiet mode
    pub fn status(&self, status: Status, message: &str) {
        if self.quiet && status != Status::Fail {
            return;
        }
        if self.use_color {
            self.write(&format!("{} {message}", status.styled()));
        } else {
            self.write(&format!("{} {message}", status.tag()));
        }
    }

    /// Shorthand for an info line
    pub fn info(&self, message: &str) {
        self.status(Status::Info, message);
    }

    /// Section title preceded by a blank line
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        self.write("");
        if self.use_color {
            self.write(&style(title).bold().underlined().to_string());
        } else {
            self.write(&format!("=== {title} ==="));
        }
    }

    /// Report a setup check
    pub fn check(&self, item: &CheckItem) {
        self.status(Status::of_check(item), &check_line(item));
    }

    /// Report one test result, with its failure screenshot if any
    pub fn result(&self, result: &TestResult) {
        let status = if result.passed { Status::Pass } else { Status::Fail };
        self.status(status, &result_line(result));
        if let Some(shot) = &result.screenshot {
            self.info(&format!("screenshot: {}", shot.display()));
        }
    }

    /// Every result followed by the tally
    pub fn suite(&self, results: &SuiteResults) {
        for result in &results.results {
            self.result(result);
        }
        if self.quiet && results.all_passed() {
            return;
        }
        self.write("");
        let line = summary_line(results);
        if self.use_color {
            let styled = if results.all_passed() {
                style(line).green().bold()
            } else {
                style(line).red().bold()
            };
            self.write(&styled.to_string());
        } else {
            self.write(&line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn item(ok: bool, required: bool) -> CheckItem {
        CheckItem {
            label: "admin-prototype.html - admin prototype page".to_string(),
            ok,
            required,
        }
    }

    fn suite(results: Vec<TestResult>, skipped: usize) -> SuiteResults {
        SuiteResults {
            suite_name: "smoke".to_string(),
            results,
            skipped,
            duration: Duration::from_millis(1500),
        }
    }

    mod status_tests {
        use super::*;

        #[test]
        fn test_check_status() {
            assert_eq!(Status::of_check(&item(true, true)), Status::Pass);
            assert_eq!(Status::of_check(&item(false, true)), Status::Fail);
            assert_eq!(Status::of_check(&item(false, false)), Status::Warn);
        }

        #[test]
        fn test_tags() {
            assert_eq!(Status::Pass.tag(), "PASS");
            assert_eq!(Status::Warn.tag(), "WARN");
        }
    }

    mod line_tests {
        use super::*;

        #[test]
        fn test_missing_check_is_marked() {
            assert!(check_line(&item(false, true)).ends_with("(missing)"));
            assert!(!check_line(&item(true, true)).contains("missing"));
        }

        #[test]
        fn test_failed_result_carries_error() {
            let failed = TestResult::fail("test_form_entry", "field holds \"\"")
                .with_duration(Duration::from_millis(250));
            assert_eq!(
                result_line(&failed),
                "test_form_entry (0.25s): field holds \"\""
            );
            let passed = TestResult::pass("test_role_choice");
            assert_eq!(result_line(&passed), "test_role_choice (0.00s)");
        }

        #[test]
        fn test_summary_counts_skipped() {
            let results = suite(
                vec![
                    TestResult::pass("a"),
                    TestResult::fail("b", "boom"),
                ],
                3,
            );
            assert_eq!(
                summary_line(&results),
                "FAILED 5 tests in 1.50s (1 passed, 1 failed, 3 skipped)"
            );
        }
    }

    mod reporter_tests {
        use super::*;

        #[test]
        fn test_default_reporter() {
            let reporter = ProgressReporter::default();
            assert!(reporter.use_color);
            assert!(!reporter.quiet);
        }

        #[test]
        fn test_reporting_does_not_panic() {
            let reporter = ProgressReporter::new(false, false);
            reporter.header("Checks");
            reporter.check(&item(false, false));
            reporter.result(&TestResult::fail("x", "bad").with_screenshot(Some("x.png".into())));
            reporter.suite(&suite(vec![TestResult::pass("y")], 0));
        }
    }
}
