//! Real browser backend over the Chrome DevTools Protocol.
//!
//! The traits are synchronous, so each driver owns a tokio runtime and
//! blocks on `chromiumoxide` futures. Do not call into a
//! [`ChromiumDriver`] from inside another tokio runtime.

use crate::config::{BrowserKind, DriverOptions};
use crate::driver::{
    DriverState, SelectElement, WebDriver, WebElement, DEFAULT_IMPLICIT_WAIT,
    DEFAULT_PAGE_LOAD_TIMEOUT,
};
use crate::element::ElementId;
use crate::locator::{Locator, DEFAULT_POLL_INTERVAL_MS};
use crate::provider::{Backend, DriverProvider};
use crate::result::{DoubleError, DoubleResult};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    Bounds, GetWindowForTargetParams, SetWindowBoundsParams, WindowState,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::Value;
use std::any::Any;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

const EDGE_EXECUTABLES: &[&str] = &["msedge", "microsoft-edge", "microsoft-edge-stable"];
const CHROME_EXECUTABLES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

fn script_error(e: impl std::fmt::Display) -> DoubleError {
    DoubleError::Script {
        message: e.to_string(),
    }
}

fn interaction_error(e: impl std::fmt::Display) -> DoubleError {
    DoubleError::Interaction {
        message: e.to_string(),
    }
}

/// JSON literal for embedding a Rust value in a script
fn js_literal<T: serde::Serialize + ?Sized>(value: &T) -> DoubleResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// First executable named in `names` found in one of `dirs`
fn find_executable(names: &[&str], dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    dirs.into_iter()
        .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

async fn poll_for<T, F, Fut>(locator: &Locator, wait: Duration, mut attempt: F) -> DoubleResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = chromiumoxide::error::Result<T>>,
{
    let start = Instant::now();
    loop {
        match attempt().await {
            Ok(found) => return Ok(found),
            Err(e) if start.elapsed() >= wait => {
                tracing::debug!(locator = %locator, error = %e, "lookup gave up");
                return Err(DoubleError::ElementNotFound {
                    locator: locator.key(),
                    waited_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                });
            }
            Err(_) => tokio::time::sleep(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)).await,
        }
    }
}

/// Provider launching Edge or Chrome through CDP
#[derive(Debug, Clone, Default)]
pub struct ChromiumProvider {
    executable: Option<PathBuf>,
}

impl ChromiumProvider {
    /// Create new provider that looks browsers up on `PATH`
    #[must_use]
    pub const fn new() -> Self {
        Self { executable: None }
    }

    /// Always launch `path`
    #[must_use]
    pub fn with_executable(path: impl Into<PathBuf>) -> Self {
        Self {
            executable: Some(path.into()),
        }
    }
}

impl DriverProvider for ChromiumProvider {
    fn backend(&self) -> Backend {
        Backend::Chromium
    }

    fn driver_executable(&self, browser: BrowserKind) -> DoubleResult<PathBuf> {
        if let Some(path) = &self.executable {
            return Ok(path.clone());
        }
        let names = match browser {
            BrowserKind::Edge => EDGE_EXECUTABLES,
            BrowserKind::Chrome => CHROME_EXECUTABLES,
        };
        let dirs = std::env::var_os("PATH")
            .map(|path| std::env::split_paths(&path).collect::<Vec<_>>())
            .unwrap_or_default();
        find_executable(names, dirs).ok_or_else(|| {
            DoubleError::config(format!("no {browser} executable found on PATH"))
        })
    }

    fn new_driver(&self, options: &DriverOptions) -> DoubleResult<Box<dyn WebDriver>> {
        let executable = match &options.executable {
            Some(path) => Some(path.clone()),
            None => self.driver_executable(options.browser).ok(),
        };
        Ok(Box::new(ChromiumDriver::launch(options, executable.as_deref())?))
    }

    fn new_select(&self, element: Box<dyn WebElement>) -> DoubleResult<Box<dyn SelectElement>> {
        let element = element
            .as_any()
            .downcast_ref::<ChromiumElement>()
            .ok_or_else(|| interaction_error(format!("{} is not a browser element", element.id())))?;
        Ok(Box::new(ChromiumSelect {
            element: element.clone(),
        }))
    }
}

/// Driver for a real browser session
#[derive(Debug)]
pub struct ChromiumDriver {
    runtime: Arc<Runtime>,
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    page: Page,
    implicit_wait: Duration,
    page_load_timeout: Duration,
    headless: bool,
    state: DriverState,
}

impl ChromiumDriver {
    /// Launch a browser and open a blank page.
    ///
    /// # Errors
    ///
    /// Returns `BrowserLaunch` if the browser cannot be started.
    pub fn launch(options: &DriverOptions, executable: Option<&Path>) -> DoubleResult<Self> {
        let runtime = Arc::new(
            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?,
        );

        let mut builder = BrowserConfig::builder()
            .window_size(options.window_size.0, options.window_size.1)
            .args(options.arguments.iter().cloned());
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(|message| DoubleError::BrowserLaunch { message })?;

        let (browser, page, handler) = runtime.block_on(async {
            let (browser, mut handler) =
                Browser::launch(config)
                    .await
                    .map_err(|e| DoubleError::BrowserLaunch {
                        message: e.to_string(),
                    })?;
            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });
            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| DoubleError::BrowserLaunch {
                    message: e.to_string(),
                })?;
            Ok::<_, DoubleError>((browser, page, handler))
        })?;

        tracing::info!(browser = %options.browser, headless = options.headless, "browser launched");
        Ok(Self {
            runtime,
            browser: Some(browser),
            handler: Some(handler),
            page,
            implicit_wait: DEFAULT_IMPLICIT_WAIT,
            page_load_timeout: DEFAULT_PAGE_LOAD_TIMEOUT,
            headless: options.headless,
            state: DriverState::Uninitialized,
        })
    }

    fn wrap(&self, element: Element) -> ChromiumElement {
        ChromiumElement::new(Arc::clone(&self.runtime), element, self.implicit_wait)
    }

    fn evaluate(&self, expression: String) -> DoubleResult<Value> {
        let params = EvaluateParams::builder()
            .expression(expression)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(script_error)?;
        let result = self
            .runtime
            .block_on(self.page.evaluate_expression(params))
            .map_err(script_error)?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }
}

impl WebDriver for ChromiumDriver {
    fn name(&self) -> &str {
        "chromium"
    }

    fn state(&self) -> DriverState {
        self.state
    }

    fn get(&mut self, url: &str) -> DoubleResult<()> {
        let navigation = tokio::time::timeout(self.page_load_timeout, self.page.goto(url));
        match self.runtime.block_on(navigation) {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(DoubleError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
            Err(_) => {
                return Err(DoubleError::Navigation {
                    url: url.to_string(),
                    message: format!("timed out after {:?}", self.page_load_timeout),
                })
            }
        }
        if self.state == DriverState::Uninitialized {
            self.state = DriverState::Connected;
        }
        tracing::debug!(%url, "navigated");
        Ok(())
    }

    fn current_url(&self) -> DoubleResult<String> {
        let url = self
            .runtime
            .block_on(self.page.url())
            .map_err(interaction_error)?;
        Ok(url.unwrap_or_default())
    }

    fn title(&self) -> DoubleResult<String> {
        let title = self
            .runtime
            .block_on(self.page.get_title())
            .map_err(interaction_error)?;
        Ok(title.unwrap_or_default())
    }

    fn find_element(&mut self, locator: &Locator) -> DoubleResult<Box<dyn WebElement>> {
        let page = &self.page;
        let css = locator.to_css();
        let found = self.runtime.block_on(poll_for(locator, self.implicit_wait, move || {
            page.find_element(css.clone())
        }))?;
        Ok(Box::new(self.wrap(found)))
    }

    fn find_elements(&mut self, locator: &Locator) -> DoubleResult<Vec<Box<dyn WebElement>>> {
        let found = self
            .runtime
            .block_on(self.page.find_elements(locator.to_css()))
            .map_err(interaction_error)?;
        Ok(found
            .into_iter()
            .map(|e| Box::new(self.wrap(e)) as Box<dyn WebElement>)
            .collect())
    }

    fn execute_script(&mut self, script: &str, args: &[Value]) -> DoubleResult<Value> {
        let expression = format!(
            "(function() {{ {script} }}).apply(null, {})",
            js_literal(args)?
        );
        self.evaluate(expression)
    }

    fn execute_async_script(&mut self, script: &str, args: &[Value]) -> DoubleResult<Value> {
        let expression = format!(
            "new Promise((resolve) => {{ const args = {}; args.push(resolve); \
             (function() {{ {script} }}).apply(null, args); }})",
            js_literal(args)?
        );
        self.evaluate(expression)
    }

    fn implicitly_wait(&mut self, timeout: Duration) -> DoubleResult<()> {
        self.implicit_wait = timeout;
        Ok(())
    }

    fn set_page_load_timeout(&mut self, timeout: Duration) -> DoubleResult<()> {
        self.page_load_timeout = timeout;
        Ok(())
    }

    fn maximize_window(&mut self) -> DoubleResult<()> {
        // headless windows keep the launch window size
        if self.headless {
            return Ok(());
        }
        self.runtime.block_on(async {
            let window = self
                .page
                .execute(GetWindowForTargetParams::builder().build())
                .await
                .map_err(interaction_error)?;
            let bounds = Bounds::builder().window_state(WindowState::Maximized).build();
            self.page
                .execute(SetWindowBoundsParams::new(window.window_id.clone(), bounds))
                .await
                .map_err(interaction_error)?;
            Ok(())
        })
    }

    fn save_screenshot(&mut self, path: &Path) -> DoubleResult<bool> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let screenshot = self
            .runtime
            .block_on(self.page.execute(params))
            .map_err(|e| DoubleError::Screenshot {
                message: e.to_string(),
            })?;

        use base64::Engine;
        let png = base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(|e| DoubleError::Screenshot {
                message: e.to_string(),
            })?;
        std::fs::write(path, png)?;
        Ok(true)
    }

    fn quit(&mut self) -> DoubleResult<()> {
        self.state = DriverState::Closed;
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };
        let closed = self.runtime.block_on(async {
            let closed = browser.close().await.map(|_| ());
            let _ = browser.wait().await;
            closed
        });
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        tracing::info!("browser closed");
        closed.map_err(|e| DoubleError::BrowserLaunch {
            message: format!("close failed: {e}"),
        })
    }
}

impl Drop for ChromiumDriver {
    fn drop(&mut self) {
        if self.browser.is_some() {
            if let Err(e) = self.quit() {
                tracing::warn!(error = %e, "browser did not close cleanly");
            }
        }
    }
}

const JS_TAG_NAME: &str = "function() { return this.tagName.toLowerCase(); }";
const JS_CLEAR: &str = "function() { this.value = ''; \
    this.dispatchEvent(new Event('input', { bubbles: true })); \
    this.dispatchEvent(new Event('change', { bubbles: true })); }";
const JS_SUBMIT: &str = "function() { const form = this.form || this.closest('form'); \
    if (form) { form.requestSubmit ? form.requestSubmit() : form.submit(); } }";
const JS_IS_DISPLAYED: &str = "function() { const style = getComputedStyle(this); \
    return style.visibility !== 'hidden' && style.display !== 'none' \
    && this.getClientRects().length > 0; }";
const JS_IS_ENABLED: &str = "function() { return !this.disabled; }";
const JS_IS_SELECTED: &str = "function() { return !!(this.selected || this.checked); }";

/// Element of a real page
#[derive(Debug, Clone)]
pub struct ChromiumElement {
    runtime: Arc<Runtime>,
    element: Arc<Element>,
    id: ElementId,
    implicit_wait: Duration,
}

impl ChromiumElement {
    fn new(runtime: Arc<Runtime>, element: Element, implicit_wait: Duration) -> Self {
        let id = ElementId(element.backend_node_id.inner().unsigned_abs());
        Self {
            runtime,
            element: Arc::new(element),
            id,
            implicit_wait,
        }
    }

    fn wrap(&self, element: Element) -> Self {
        Self::new(Arc::clone(&self.runtime), element, self.implicit_wait)
    }

    fn call(&self, function: &str) -> DoubleResult<Value> {
        let returned = self
            .runtime
            .block_on(self.element.call_js_fn(function, false))
            .map_err(script_error)?;
        Ok(returned.result.value.unwrap_or(Value::Null))
    }

    fn call_bool(&self, function: &str) -> DoubleResult<bool> {
        Ok(self.call(function)?.as_bool().unwrap_or(false))
    }

    fn call_string(&self, function: &str) -> DoubleResult<String> {
        Ok(match self.call(function)? {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }
}

impl WebElement for ChromiumElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn tag_name(&self) -> DoubleResult<String> {
        self.call_string(JS_TAG_NAME)
    }

    fn text(&self) -> DoubleResult<String> {
        let text = self
            .runtime
            .block_on(self.element.inner_text())
            .map_err(interaction_error)?;
        Ok(text.unwrap_or_default())
    }

    fn click(&self) -> DoubleResult<()> {
        self.runtime
            .block_on(self.element.click())
            .map_err(interaction_error)?;
        Ok(())
    }

    fn send_keys(&self, parts: &[&str]) -> DoubleResult<()> {
        self.runtime
            .block_on(self.element.type_str(parts.concat()))
            .map_err(interaction_error)?;
        Ok(())
    }

    fn clear(&self) -> DoubleResult<()> {
        self.call(JS_CLEAR).map(|_| ())
    }

    fn submit(&self) -> DoubleResult<()> {
        self.call(JS_SUBMIT).map(|_| ())
    }

    fn get_attribute(&self, name: &str) -> DoubleResult<String> {
        // property first, then attribute; booleans read as "true" or ""
        let function = format!(
            "function() {{ const name = {}; const prop = this[name]; \
             if (typeof prop === 'boolean') return prop ? 'true' : ''; \
             if (typeof prop === 'string' || typeof prop === 'number') return String(prop); \
             const attr = this.getAttribute(name); return attr === null ? '' : attr; }}",
            js_literal(name)?
        );
        self.call_string(&function)
    }

    fn is_displayed(&self) -> DoubleResult<bool> {
        self.call_bool(JS_IS_DISPLAYED)
    }

    fn is_enabled(&self) -> DoubleResult<bool> {
        self.call_bool(JS_IS_ENABLED)
    }

    fn is_selected(&self) -> DoubleResult<bool> {
        self.call_bool(JS_IS_SELECTED)
    }

    fn find_element(&self, locator: &Locator) -> DoubleResult<Box<dyn WebElement>> {
        let element = &self.element;
        let css = locator.to_css();
        let found = self.runtime.block_on(poll_for(locator, self.implicit_wait, move || {
            element.find_element(css.clone())
        }))?;
        Ok(Box::new(self.wrap(found)))
    }

    fn find_elements(&self, locator: &Locator) -> DoubleResult<Vec<Box<dyn WebElement>>> {
        let found = self
            .runtime
            .block_on(self.element.find_elements(locator.to_css()))
            .map_err(interaction_error)?;
        Ok(found
            .into_iter()
            .map(|e| Box::new(self.wrap(e)) as Box<dyn WebElement>)
            .collect())
    }

    fn boxed_clone(&self) -> Box<dyn WebElement> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `<select>` wrapper driven through page scripts
#[derive(Debug, Clone)]
pub struct ChromiumSelect {
    element: ChromiumElement,
}

impl ChromiumSelect {
    fn pick(&self, matcher: &str, wanted: &str) -> DoubleResult<()> {
        let function = format!(
            "function() {{ const wanted = {wanted}; \
             const option = Array.from(this.options).find((o, i) => {matcher}); \
             if (!option) return false; option.selected = true; \
             this.dispatchEvent(new Event('change', {{ bubbles: true }})); return true; }}"
        );
        if self.element.call_bool(&function)? {
            Ok(())
        } else {
            Err(interaction_error(format!("no option matching {wanted}")))
        }
    }

    fn collect(&self, css: &str) -> DoubleResult<Vec<Box<dyn WebElement>>> {
        self.element.find_elements(&Locator::css(css))
    }
}

impl SelectElement for ChromiumSelect {
    fn select_by_value(&self, value: &str) -> DoubleResult<()> {
        self.pick("o.value === wanted", &js_literal(value)?)
    }

    fn select_by_visible_text(&self, text: &str) -> DoubleResult<()> {
        self.pick("o.text.trim() === wanted", &js_literal(text)?)
    }

    fn select_by_index(&self, index: usize) -> DoubleResult<()> {
        self.pick("i === wanted", &index.to_string())
    }

    fn options(&self) -> DoubleResult<Vec<Box<dyn WebElement>>> {
        self.collect("option")
    }

    fn first_selected_option(&self) -> DoubleResult<Option<Box<dyn WebElement>>> {
        Ok(self.collect("option:checked")?.into_iter().next())
    }

    fn all_selected_options(&self) -> DoubleResult<Vec<Box<dyn WebElement>>> {
        self.collect("option:checked")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_js_literal_escapes_quotes() {
        assert_eq!(js_literal("a'b\"c").unwrap(), r#""a'b\"c""#);
        assert_eq!(
            js_literal(&[Value::from(1), Value::from("x")][..]).unwrap(),
            r#"[1,"x"]"#
        );
    }

    #[test]
    fn test_find_executable_searches_dirs_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        std::fs::write(second.path().join("chromium"), b"").unwrap();
        let found = find_executable(
            CHROME_EXECUTABLES,
            [first.path().to_path_buf(), second.path().to_path_buf()],
        );
        assert_eq!(found, Some(second.path().join("chromium")));
        assert_eq!(find_executable(EDGE_EXECUTABLES, [first.path().to_path_buf()]), None);
    }

    #[test]
    fn test_explicit_executable_wins() {
        let provider = ChromiumProvider::with_executable("/opt/edge/msedge");
        assert_eq!(
            provider.driver_executable(BrowserKind::Chrome).unwrap(),
            PathBuf::from("/opt/edge/msedge")
        );
        assert_eq!(provider.backend(), Backend::Chromium);
    }

    #[test]
    #[ignore = "launches a local browser"]
    fn test_blank_page_session() {
        let options = DriverOptions {
            headless: true,
            arguments: vec!["--headless".to_string(), "--no-sandbox".to_string()],
            ..DriverOptions::default()
        };
        let mut driver = ChromiumProvider::new().new_driver(&options).unwrap();
        driver.get("about:blank").unwrap();
        let value = driver.execute_script("return arguments[0] + 1;", &[Value::from(41)]).unwrap();
        assert_eq!(value, Value::from(42));
        driver.implicitly_wait(Duration::from_millis(200)).unwrap();
        let err = driver.find_element(&Locator::id("missing")).unwrap_err();
        assert!(matches!(err, DoubleError::ElementNotFound { .. }));
        driver.quit().unwrap();
        driver.quit().unwrap();
    }
}
