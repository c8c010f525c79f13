//! End-to-end tests of the mock layer through the public API.

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use webdouble::prelude::*;
use webdouble::{
    BackendChoice, DriverOptions, MapEnv, MockProvider, RunOptions, SlowMotion, TraceEvent,
};

fn quiet_driver() -> MockDriver {
    MockDriver::with_sink(TraceSink::silent())
}

fn ci_env() -> EnvironmentDetector<MapEnv> {
    EnvironmentDetector::new(MapEnv::new().with("GITHUB_ACTIONS", "true"))
}

// ============================================================================
// Driver scenario
// ============================================================================

#[test]
fn admin_page_scenario() {
    let mut driver = quiet_driver();
    driver.get("file:///admin.html").unwrap();
    assert_eq!(WebDriver::current_url(&driver).unwrap(), "file:///admin.html");

    let locator = Locator::from((By::Id, "addUserBtn"));
    let first = driver.find_element(&locator);
    let second = driver.find_element(&locator);
    assert!(first.same_node(&second));

    driver.quit().unwrap();
    assert!(driver.save_screenshot(Path::new("after_quit.png")).unwrap());
}

#[test]
fn plural_lookup_is_three_fresh_elements() {
    let mut driver = quiet_driver();
    let locator = Locator::css("#userTable tbody tr");
    let a = WebDriver::find_elements(&mut driver, &locator).unwrap();
    let b = WebDriver::find_elements(&mut driver, &locator).unwrap();
    assert_eq!(a.len(), 3);
    assert_eq!(b.len(), 3);
    assert!(a.iter().zip(&b).all(|(x, y)| x.id() != y.id()));
}

#[test]
fn element_value_semantics() {
    let mut driver = quiet_driver();
    let input = driver.find_element(&Locator::id("userName"));
    let _ = input.send_keys(&["a"]).send_keys(&["b"]);
    assert_eq!(input.get_attribute("value"), "b");
    let _ = input.clear();
    assert_eq!(input.get_attribute("value"), "");
}

#[test]
fn selected_flag_follows_attribute() {
    let element = MockElement::new("input", "Active", TraceSink::silent());
    assert!(!element.is_selected());
    let _ = element.set_attribute("selected", "true");
    assert!(element.is_selected());
}

#[test]
fn trace_lines_are_tagged_and_indented() {
    let sink = TraceSink::silent();
    let mut driver = MockDriver::with_sink(sink.clone());
    driver.get("file:///admin.html").unwrap();
    let button = driver.find_element(&Locator::id("addUserBtn"));
    let _ = button.click();
    let _ = button.find_element(&Locator::tag("span"));

    let events: Vec<TraceEvent> = sink.events();
    let depths: Vec<usize> = events.iter().map(|e| e.depth).collect();
    assert_eq!(depths, [0, 0, 1, 1, 2]);
    assert!(sink.lines().iter().all(|l| l.trim_start().starts_with("[MOCK]")));
}

// ============================================================================
// Environment and provider
// ============================================================================

#[test]
fn headless_detection() {
    assert!(ci_env().is_headless());
    assert!(EnvironmentDetector::new(MapEnv::new()).is_headless());
    assert!(!EnvironmentDetector::new(MapEnv::new().with("DISPLAY", ":0")).is_headless());
    assert!(!EnvironmentDetector::new(MapEnv::new().with("DISPLAY", ":0").with("CI", "")).is_headless());
}

#[test]
fn session_provider_builds_mocks() {
    let config = HarnessConfig::default().with_backend(BackendChoice::Auto);
    let provider = webdouble::select_provider(&config, &ci_env()).unwrap();
    let mut driver = provider.new_driver(&DriverOptions {
        echo_trace: false,
        ..DriverOptions::default()
    })
    .unwrap();
    let element = driver.find_element(&Locator::id("userRole")).unwrap();
    let select = provider.new_select(element).unwrap();
    select.select_by_visible_text("Administrator").unwrap();
    assert_eq!(
        select.first_selected_option().unwrap().unwrap().text().unwrap(),
        "Option 1"
    );
}

// ============================================================================
// Harness with a page object
// ============================================================================

struct UsersPage {
    locators: LocatorTable,
}

impl UsersPage {
    fn new() -> Self {
        Self {
            locators: LocatorTable::new()
                .with("add_user", Locator::id("addUserBtn"))
                .with("name", Locator::id("userName"))
                .with("email", Locator::id("userEmail"))
                .with("role", Locator::id("userRole"))
                .with("save", Locator::id("saveUserBtn"))
                .with("rows", Locator::css("#userTable tbody tr")),
        }
    }

    fn add_user(&self, pd: &mut PageDriver<'_>, name: &str, email: &str) -> DoubleResult<()> {
        pd.click(self.locators.get("add_user")?)?;
        pd.fill(self.locators.get("name")?, name)?;
        pd.fill(self.locators.get("email")?, email)?;
        pd.choose(self.locators.get("role")?, &SelectBy::Text("Editor".to_string()))?;
        pd.click(self.locators.get("save")?)
    }
}

impl PageObject for UsersPage {
    fn url_pattern(&self) -> &str {
        "admin-prototype.html"
    }
}

#[test]
fn suite_runs_page_object_flow_on_mock() {
    let dir = TempDir::new().unwrap();
    let sink = TraceSink::silent();
    let config = HarnessConfig::default()
        .with_project_root(dir.path())
        .with_echo_trace(false);
    let session =
        TestSession::with_provider(config, Arc::new(MockProvider::with_sink(sink.clone())))
            .unwrap();

    let suite = TestSuite::new("users")
        .with_test(
            TestCase::new("test_add_user", |ctx| {
                let page = UsersPage::new();
                let mut pd = PageDriver::from_context(ctx);
                ensure!(pd.is_on(&page)?, "not on the users page");
                page.add_user(&mut pd, "Alice", "alice@example.com")?;
                let email = pd.value_of(page.locators.get("email")?)?;
                ensure!(email == "alice@example.com", "email was {email}");
                Ok(())
            })
            .with_marker(Marker::UserManagement)
            .with_marker(Marker::Smoke)
            .on_admin_page(),
        )
        .with_test(
            TestCase::new("test_table_rows", |ctx| {
                let page = UsersPage::new();
                let mut pd = PageDriver::from_context(ctx);
                let rows = pd.rows(page.locators.get("rows")?)?;
                ensure!(rows.len() == 3, "got {} rows", rows.len());
                Ok(())
            })
            .with_marker(Marker::UserManagement),
        )
        .with_test(
            TestCase::new("test_slow_report", |_ctx| Ok(())).with_marker(Marker::Slow),
        );

    let results = session.run_suite(&suite, &RunOptions::new().with_marker(Marker::UserManagement));
    assert!(results.all_passed(), "{:?}", results.failures());
    assert_eq!(results.total(), 2);
    assert_eq!(results.skipped, 1);
    assert_eq!(sink.count("quit"), 2);
    assert_eq!(sink.count("select_by_visible_text"), 1);
    session.finish().unwrap();
}

#[test]
fn page_driver_without_session() {
    let mut driver = quiet_driver();
    let provider = MockProvider::with_sink(driver.sink().clone());
    let page = UsersPage::new();
    let mut pd = PageDriver::new(&mut driver, &provider, SlowMotion::OFF);
    pd.open("file:///srv/admin-prototype.html").unwrap();
    page.add_user(&mut pd, "Bob", "bob@example.com").unwrap();
    assert!(pd.is_visible(page.locators.get("save").unwrap()).unwrap());
}
