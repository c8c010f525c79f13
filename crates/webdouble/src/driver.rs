//! Browser automation traits and the mock driver.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  WebDriver / WebElement / SelectElement (object-safe traits)      │
//! ├───────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────┐          ┌─────────────────────────┐     │
//! │  │  MockDriver         │          │  ChromiumDriver         │     │
//! │  │  (default)          │          │  (feature = "browser")  │     │
//! │  │  in-memory nodes,   │          │  CDP via chromiumoxide  │     │
//! │  │  trace lines only   │          │                         │     │
//! │  └─────────────────────┘          └─────────────────────────┘     │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Fixtures and page objects only see the traits; a
//! [`DriverProvider`](crate::provider::DriverProvider) decides which
//! implementation they get.

use crate::element::{ElementId, MockElement};
use crate::locator::Locator;
use crate::result::DoubleResult;
use crate::trace::{TraceEvent, TraceSink};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Default implicit wait (10 seconds)
pub const DEFAULT_IMPLICIT_WAIT: Duration = Duration::from_secs(10);

/// Default page load timeout (30 seconds)
pub const DEFAULT_PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Lifecycle of a driver session
///
/// Recorded for inspection only; neither backend refuses calls in `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverState {
    /// Constructed, nothing loaded yet
    Uninitialized,
    /// A page has been navigated to
    Connected,
    /// `quit` has been called
    Closed,
}

/// A handle to one UI node
pub trait WebElement: fmt::Debug + Send + Sync {
    /// Node identity; equal ids mean the same node
    fn id(&self) -> ElementId;

    /// Tag name
    fn tag_name(&self) -> DoubleResult<String>;

    /// Visible text
    fn text(&self) -> DoubleResult<String>;

    /// Click
    fn click(&self) -> DoubleResult<()>;

    /// Type the concatenation of `parts`
    fn send_keys(&self, parts: &[&str]) -> DoubleResult<()>;

    /// Clear the input value
    fn clear(&self) -> DoubleResult<()>;

    /// Submit the enclosing form
    fn submit(&self) -> DoubleResult<()>;

    /// Attribute or property value; absent reads as `""`
    fn get_attribute(&self, name: &str) -> DoubleResult<String>;

    /// Visibility
    fn is_displayed(&self) -> DoubleResult<bool>;

    /// Enabled state
    fn is_enabled(&self) -> DoubleResult<bool>;

    /// Selection state
    fn is_selected(&self) -> DoubleResult<bool>;

    /// First descendant matching `locator`
    fn find_element(&self, locator: &Locator) -> DoubleResult<Box<dyn WebElement>>;

    /// All descendants matching `locator`
    fn find_elements(&self, locator: &Locator) -> DoubleResult<Vec<Box<dyn WebElement>>>;

    /// Another handle to the same node
    fn boxed_clone(&self) -> Box<dyn WebElement>;

    /// Downcast support for providers
    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn WebElement> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

/// A dropdown wrapper around a `<select>` element
pub trait SelectElement: fmt::Debug + Send + Sync {
    /// Select the option whose `value` matches
    fn select_by_value(&self, value: &str) -> DoubleResult<()>;

    /// Select the option whose text matches
    fn select_by_visible_text(&self, text: &str) -> DoubleResult<()>;

    /// Select the option at `index`
    fn select_by_index(&self, index: usize) -> DoubleResult<()>;

    /// All options
    fn options(&self) -> DoubleResult<Vec<Box<dyn WebElement>>>;

    /// First selected option
    fn first_selected_option(&self) -> DoubleResult<Option<Box<dyn WebElement>>>;

    /// All selected options
    fn all_selected_options(&self) -> DoubleResult<Vec<Box<dyn WebElement>>>;
}

/// Abstract browser driver
///
/// # Implementations
///
/// - `MockDriver` - in-memory, never fails
/// - `ChromiumDriver` - real browser over CDP (`browser` feature)
pub trait WebDriver: fmt::Debug + Send + Sync {
    /// Backend name
    fn name(&self) -> &str;

    /// Current lifecycle state
    fn state(&self) -> DriverState;

    /// Navigate to `url`
    fn get(&mut self, url: &str) -> DoubleResult<()>;

    /// Current location
    fn current_url(&self) -> DoubleResult<String>;

    /// Window title
    fn title(&self) -> DoubleResult<String>;

    /// First element matching `locator`
    fn find_element(&mut self, locator: &Locator) -> DoubleResult<Box<dyn WebElement>>;

    /// All elements matching `locator`
    fn find_elements(&mut self, locator: &Locator) -> DoubleResult<Vec<Box<dyn WebElement>>>;

    /// Run a script in page context
    fn execute_script(&mut self, script: &str, args: &[Value]) -> DoubleResult<Value>;

    /// Run an asynchronous script in page context
    fn execute_async_script(&mut self, script: &str, args: &[Value]) -> DoubleResult<Value>;

    /// Set how long element lookups wait
    fn implicitly_wait(&mut self, timeout: Duration) -> DoubleResult<()>;

    /// Set how long navigation waits
    fn set_page_load_timeout(&mut self, timeout: Duration) -> DoubleResult<()>;

    /// Maximize the browser window
    fn maximize_window(&mut self) -> DoubleResult<()>;

    /// Write a PNG screenshot to `path`; returns whether it was saved
    fn save_screenshot(&mut self, path: &Path) -> DoubleResult<bool>;

    /// End the session; calling twice is not an error
    fn quit(&mut self) -> DoubleResult<()>;
}

const MOCK_WINDOW_HANDLE: &str = "mock_handle_1";
const MOCK_PAGE_SOURCE: &str = "<html><body>Mock Page</body></html>";

/// In-memory driver for headless runs
///
/// Single-element lookups are cached by locator, so the same locator always
/// yields the same node. Plural lookups allocate fresh nodes every call.
#[derive(Debug)]
pub struct MockDriver {
    current_url: String,
    title: String,
    elements: HashMap<Locator, MockElement>,
    implicit_wait: Duration,
    page_load_timeout: Duration,
    state: DriverState,
    sink: TraceSink,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::with_sink(TraceSink::default())
    }
}

impl MockDriver {
    /// Create new mock driver echoing trace lines to stdout
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock driver recording into `sink`
    #[must_use]
    pub fn with_sink(sink: TraceSink) -> Self {
        sink.emit("init", 0, "Initializing WebDriver (headless mock)");
        Self {
            current_url: "about:blank".to_string(),
            title: "Mock Browser".to_string(),
            elements: HashMap::new(),
            implicit_wait: DEFAULT_IMPLICIT_WAIT,
            page_load_timeout: DEFAULT_PAGE_LOAD_TIMEOUT,
            state: DriverState::Uninitialized,
            sink,
        }
    }

    /// Current location
    #[must_use]
    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    /// Window title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Open window handles
    #[must_use]
    pub fn window_handles(&self) -> Vec<String> {
        vec![MOCK_WINDOW_HANDLE.to_string()]
    }

    /// Handle of the current window
    #[must_use]
    pub fn current_window_handle(&self) -> &str {
        MOCK_WINDOW_HANDLE
    }

    /// Placeholder page source
    #[must_use]
    pub fn page_source(&self) -> &str {
        MOCK_PAGE_SOURCE
    }

    /// Stored implicit wait
    #[must_use]
    pub const fn implicit_wait(&self) -> Duration {
        self.implicit_wait
    }

    /// Stored page load timeout
    #[must_use]
    pub const fn page_load_timeout(&self) -> Duration {
        self.page_load_timeout
    }

    /// Number of cached single-element lookups
    #[must_use]
    pub fn cached_elements(&self) -> usize {
        self.elements.len()
    }

    /// Trace sink shared with every element this driver hands out
    #[must_use]
    pub const fn sink(&self) -> &TraceSink {
        &self.sink
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<TraceEvent> {
        self.sink.events()
    }

    /// Check if an operation was traced
    #[must_use]
    pub fn was_called(&self, op: &str) -> bool {
        self.sink.count(op) > 0
    }

    /// Look up or lazily create the node for `locator`
    pub fn find_element(&mut self, locator: &Locator) -> MockElement {
        let sink = &self.sink;
        let element = self
            .elements
            .entry(locator.clone())
            .or_insert_with(|| {
                MockElement::new("div", "Mock Element", sink.clone()).with_locator(locator.clone())
            })
            .clone();
        self.sink
            .emit("find_element", 1, format!("Found element: {locator}"));
        element
    }

    /// Three fresh nodes; never cached
    pub fn find_elements(&mut self, locator: &Locator) -> Vec<MockElement> {
        self.sink.emit(
            "find_elements",
            1,
            format!("Found elements: {locator} (returning 3 mock elements)"),
        );
        (1..=3)
            .map(|i| MockElement::new("div", format!("Element {i}"), self.sink.clone()))
            .collect()
    }

    fn trace_script(&self, op: &str, label: &str, script: &str) {
        let preview: String = script.chars().take(50).collect();
        self.sink
            .emit(op, 1, format!("Executed {label}script: {preview}..."));
    }
}

impl WebDriver for MockDriver {
    fn name(&self) -> &str {
        "mock"
    }

    fn state(&self) -> DriverState {
        self.state
    }

    fn get(&mut self, url: &str) -> DoubleResult<()> {
        url.clone_into(&mut self.current_url);
        if self.state == DriverState::Uninitialized {
            self.state = DriverState::Connected;
        }
        self.sink.emit("get", 0, format!("Navigated to: {url}"));
        Ok(())
    }

    fn current_url(&self) -> DoubleResult<String> {
        Ok(self.current_url.clone())
    }

    fn title(&self) -> DoubleResult<String> {
        Ok(self.title.clone())
    }

    fn find_element(&mut self, locator: &Locator) -> DoubleResult<Box<dyn WebElement>> {
        Ok(Box::new(Self::find_element(self, locator)))
    }

    fn find_elements(&mut self, locator: &Locator) -> DoubleResult<Vec<Box<dyn WebElement>>> {
        Ok(Self::find_elements(self, locator)
            .into_iter()
            .map(|e| Box::new(e) as Box<dyn WebElement>)
            .collect())
    }

    fn execute_script(&mut self, script: &str, _args: &[Value]) -> DoubleResult<Value> {
        self.trace_script("execute_script", "", script);
        Ok(Value::Null)
    }

    fn execute_async_script(&mut self, script: &str, _args: &[Value]) -> DoubleResult<Value> {
        self.trace_script("execute_async_script", "async ", script);
        Ok(Value::Null)
    }

    fn implicitly_wait(&mut self, timeout: Duration) -> DoubleResult<()> {
        self.implicit_wait = timeout;
        self.sink.emit(
            "implicitly_wait",
            0,
            format!("Set implicit wait: {}s", timeout.as_secs_f64()),
        );
        Ok(())
    }

    fn set_page_load_timeout(&mut self, timeout: Duration) -> DoubleResult<()> {
        self.page_load_timeout = timeout;
        self.sink.emit(
            "set_page_load_timeout",
            0,
            format!("Set page load timeout: {}s", timeout.as_secs_f64()),
        );
        Ok(())
    }

    fn maximize_window(&mut self) -> DoubleResult<()> {
        self.sink.emit("maximize_window", 0, "Maximized window");
        Ok(())
    }

    fn save_screenshot(&mut self, path: &Path) -> DoubleResult<bool> {
        self.sink.emit(
            "save_screenshot",
            0,
            format!("Screenshot saved to: {}", path.display()),
        );
        Ok(true)
    }

    fn quit(&mut self) -> DoubleResult<()> {
        self.state = DriverState::Closed;
        self.sink.emit("quit", 0, "WebDriver quit");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> MockDriver {
        MockDriver::with_sink(TraceSink::silent())
    }

    mod lookup_tests {
        use super::*;

        #[test]
        fn test_find_element_is_identity_stable() {
            let mut driver = driver();
            let locator = Locator::id("addUserBtn");
            let first = driver.find_element(&locator);
            let second = driver.find_element(&locator);
            assert!(first.same_node(&second));
            assert_eq!(driver.cached_elements(), 1);
        }

        #[test]
        fn test_distinct_locators_distinct_nodes() {
            let mut driver = driver();
            let a = driver.find_element(&Locator::id("userName"));
            let b = driver.find_element(&Locator::css("userName"));
            assert!(!a.same_node(&b));
            assert_eq!(driver.cached_elements(), 2);
        }

        #[test]
        fn test_cached_node_keeps_state() {
            let mut driver = driver();
            let locator = Locator::id("userEmail");
            let _ = driver.find_element(&locator).send_keys(&["a@b.c"]);
            assert_eq!(driver.find_element(&locator).get_attribute("value"), "a@b.c");
        }

        #[test]
        fn test_find_elements_returns_three_fresh_nodes() {
            let mut driver = driver();
            let locator = Locator::css("#userTable tbody tr");
            let first = driver.find_elements(&locator);
            let second = driver.find_elements(&locator);
            assert_eq!(first.len(), 3);
            assert_eq!(second.len(), 3);
            for (a, b) in first.iter().zip(&second) {
                assert!(!a.same_node(b));
            }
            assert_eq!(driver.cached_elements(), 0);
        }

        #[test]
        fn test_trait_lookup_preserves_identity() {
            let mut driver = driver();
            let web: &mut dyn WebDriver = &mut driver;
            let locator = Locator::id("saveUserBtn");
            let a = web.find_element(&locator).unwrap();
            let b = web.find_element(&locator).unwrap();
            assert_eq!(a.id(), b.id());
        }

        #[test]
        fn test_cached_node_records_locator() {
            let mut driver = driver();
            let locator = Locator::id("roleName");
            assert_eq!(driver.find_element(&locator).locator(), Some(locator));
        }
    }

    mod navigation_tests {
        use super::*;

        #[test]
        fn test_initial_state() {
            let driver = driver();
            assert_eq!(driver.current_url(), "about:blank");
            assert_eq!(driver.title(), "Mock Browser");
            assert_eq!(driver.window_handles(), ["mock_handle_1"]);
            assert_eq!(WebDriver::state(&driver), DriverState::Uninitialized);
        }

        #[test]
        fn test_get_records_url_and_connects() {
            let mut driver = driver();
            driver.get("file:///admin.html").unwrap();
            assert_eq!(driver.current_url(), "file:///admin.html");
            assert_eq!(WebDriver::state(&driver), DriverState::Connected);
        }

        #[test]
        fn test_quit_is_idempotent() {
            let mut driver = driver();
            driver.get("file:///admin.html").unwrap();
            driver.quit().unwrap();
            driver.quit().unwrap();
            assert_eq!(WebDriver::state(&driver), DriverState::Closed);
            assert_eq!(driver.sink().count("quit"), 2);
        }

        #[test]
        fn test_calls_after_quit_still_succeed() {
            let mut driver = driver();
            driver.quit().unwrap();
            driver.get("file:///other.html").unwrap();
            assert!(driver.save_screenshot(Path::new("after.png")).unwrap());
            assert_eq!(WebDriver::state(&driver), DriverState::Closed);
        }
    }

    mod settings_tests {
        use super::*;

        #[test]
        fn test_default_timeouts() {
            let driver = driver();
            assert_eq!(driver.implicit_wait(), Duration::from_secs(10));
            assert_eq!(driver.page_load_timeout(), Duration::from_secs(30));
        }

        #[test]
        fn test_timeouts_are_stored() {
            let mut driver = driver();
            driver.implicitly_wait(Duration::from_secs(3)).unwrap();
            driver
                .set_page_load_timeout(Duration::from_millis(1500))
                .unwrap();
            assert_eq!(driver.implicit_wait(), Duration::from_secs(3));
            assert_eq!(driver.page_load_timeout(), Duration::from_millis(1500));
        }

        #[test]
        fn test_scripts_return_null() {
            let mut driver = driver();
            let v = driver
                .execute_script("return document.title;", &[])
                .unwrap();
            assert_eq!(v, Value::Null);
            let v = driver
                .execute_async_script("arguments[0]();", &[Value::Bool(true)])
                .unwrap();
            assert_eq!(v, Value::Null);
        }

        #[test]
        fn test_script_trace_truncates_to_fifty_chars() {
            let mut driver = driver();
            let script = "x".repeat(80);
            let _ = driver.execute_script(&script, &[]).unwrap();
            let last = driver.history().pop().unwrap();
            assert_eq!(last.detail, format!("Executed script: {}...", "x".repeat(50)));
        }
    }

    mod history_tests {
        use super::*;

        #[test]
        fn test_history_records_operations_in_order() {
            let mut driver = driver();
            driver.get("file:///admin.html").unwrap();
            driver.maximize_window().unwrap();
            let ops: Vec<String> = driver.history().into_iter().map(|e| e.op).collect();
            assert_eq!(ops, ["init", "get", "maximize_window"]);
        }

        #[test]
        fn test_element_events_land_in_driver_history() {
            let mut driver = driver();
            let _ = driver.find_element(&Locator::id("addUserBtn")).click();
            assert!(driver.was_called("click"));
            assert!(!driver.was_called("submit"));
        }

        #[test]
        fn test_rendered_lines() {
            let mut driver = driver();
            driver.get("file:///admin.html").unwrap();
            let _ = driver.find_element(&Locator::id("nav-users"));
            let lines = driver.sink().lines();
            assert_eq!(lines[1], "[MOCK] Navigated to: file:///admin.html");
            assert_eq!(lines[2], "  [MOCK] Found element: id=nav-users");
        }
    }
}
