//! Page object support.
//!
//! Page objects name their locators in a [`LocatorTable`] and drive the
//! page through a [`PageDriver`], which works on either backend.

use crate::config::SlowMotion;
use crate::driver::{WebDriver, WebElement};
use crate::harness::TestContext;
use crate::locator::Locator;
use crate::provider::DriverProvider;
use crate::result::{DoubleError, DoubleResult};
use std::collections::BTreeMap;

/// A page or component of the UI under test
///
/// # Example
///
/// ```ignore
/// struct UsersPage {
///     locators: LocatorTable,
/// }
///
/// impl PageObject for UsersPage {
///     fn url_pattern(&self) -> &str {
///         "admin-prototype.html"
///     }
/// }
/// ```
pub trait PageObject {
    /// URL suffix that identifies this page
    fn url_pattern(&self) -> &str;

    /// How long the page may take to load (milliseconds)
    fn load_timeout_ms(&self) -> u64 {
        30000
    }

    /// Name for logs
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether `url` points at this page
    fn matches_url(&self, url: &str) -> bool {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        path.ends_with(self.url_pattern())
    }
}

/// Named locators of one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatorTable {
    locators: BTreeMap<String, Locator>,
}

impl LocatorTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a locator under `name`
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, locator: Locator) -> Self {
        let _ = self.locators.insert(name.into(), locator);
        self
    }

    /// Look up a locator.
    ///
    /// # Errors
    ///
    /// Unknown names are a configuration error.
    pub fn get(&self, name: &str) -> DoubleResult<&Locator> {
        self.locators
            .get(name)
            .ok_or_else(|| DoubleError::config(format!("no locator named '{name}'")))
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.locators.keys().map(String::as_str).collect()
    }

    /// Number of locators
    #[must_use]
    pub fn len(&self) -> usize {
        self.locators.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }
}

/// How to pick a dropdown option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectBy {
    /// By `value` attribute
    Value(String),
    /// By visible text
    Text(String),
    /// By position
    Index(usize),
}

/// Page helpers over a live driver
///
/// Each action is followed by the slow-motion pause.
#[derive(Debug)]
pub struct PageDriver<'a> {
    driver: &'a mut dyn WebDriver,
    provider: &'a dyn DriverProvider,
    pacing: SlowMotion,
}

impl<'a> PageDriver<'a> {
    /// Wrap a driver
    pub fn new(
        driver: &'a mut dyn WebDriver,
        provider: &'a dyn DriverProvider,
        pacing: SlowMotion,
    ) -> Self {
        Self {
            driver,
            provider,
            pacing,
        }
    }

    /// Wrap the driver of a running test
    pub fn from_context(ctx: &'a mut TestContext<'_>) -> Self {
        let pacing = ctx.config.slow_motion();
        Self {
            driver: &mut *ctx.driver,
            provider: ctx.provider,
            pacing,
        }
    }

    /// Underlying driver
    pub fn driver(&mut self) -> &mut dyn WebDriver {
        &mut *self.driver
    }

    fn pause(&self) {
        self.pacing.pause(None);
    }

    /// Navigate to `url`.
    ///
    /// # Errors
    ///
    /// Propagates navigation failures.
    pub fn open(&mut self, url: &str) -> DoubleResult<()> {
        self.driver.get(url)?;
        self.pause();
        Ok(())
    }

    /// Whether the driver is currently on `page`.
    ///
    /// # Errors
    ///
    /// Propagates driver failures.
    pub fn is_on<P: PageObject + ?Sized>(&self, page: &P) -> DoubleResult<bool> {
        Ok(page.matches_url(&self.driver.current_url()?))
    }

    /// Find the element for `locator`.
    ///
    /// # Errors
    ///
    /// Propagates lookup failures.
    pub fn element(&mut self, locator: &Locator) -> DoubleResult<Box<dyn WebElement>> {
        self.driver.find_element(locator)
    }

    /// Click the element.
    ///
    /// # Errors
    ///
    /// Propagates lookup and interaction failures.
    pub fn click(&mut self, locator: &Locator) -> DoubleResult<()> {
        self.element(locator)?.click()?;
        self.pause();
        Ok(())
    }

    /// Clear the input, then type `text`.
    ///
    /// # Errors
    ///
    /// Propagates lookup and interaction failures.
    pub fn fill(&mut self, locator: &Locator, text: &str) -> DoubleResult<()> {
        let element = self.element(locator)?;
        element.clear()?;
        element.send_keys(&[text])?;
        self.pause();
        Ok(())
    }

    /// Pick an option of a `<select>`.
    ///
    /// # Errors
    ///
    /// Propagates lookup and selection failures.
    pub fn choose(&mut self, locator: &Locator, by: &SelectBy) -> DoubleResult<()> {
        let element = self.element(locator)?;
        let select = self.provider.new_select(element)?;
        match by {
            SelectBy::Value(value) => select.select_by_value(value)?,
            SelectBy::Text(text) => select.select_by_visible_text(text)?,
            SelectBy::Index(index) => select.select_by_index(*index)?,
        }
        self.pause();
        Ok(())
    }

    /// Visible text of the element.
    ///
    /// # Errors
    ///
    /// Propagates lookup failures.
    pub fn text_of(&mut self, locator: &Locator) -> DoubleResult<String> {
        self.element(locator)?.text()
    }

    /// Current `value` of an input.
    ///
    /// # Errors
    ///
    /// Propagates lookup failures.
    pub fn value_of(&mut self, locator: &Locator) -> DoubleResult<String> {
        self.element(locator)?.get_attribute("value")
    }

    /// Whether the element is displayed.
    ///
    /// # Errors
    ///
    /// Propagates lookup failures.
    pub fn is_visible(&mut self, locator: &Locator) -> DoubleResult<bool> {
        self.element(locator)?.is_displayed()
    }

    /// All elements matching `locator`, e.g. table rows.
    ///
    /// # Errors
    ///
    /// Propagates lookup failures.
    pub fn rows(&mut self, locator: &Locator) -> DoubleResult<Vec<Box<dyn WebElement>>> {
        self.driver.find_elements(locator)
    }
}
