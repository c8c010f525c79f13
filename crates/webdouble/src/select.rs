//! Dropdown stand-in.
//!
//! Selection calls only trace; they leave the wrapped element and the
//! placeholder options untouched, so post-selection state never changes.

use crate::driver::{SelectElement, WebElement};
use crate::element::MockElement;
use crate::result::DoubleResult;

/// Dropdown wrapper around a [`MockElement`]
#[derive(Debug, Clone)]
pub struct MockSelect {
    element: MockElement,
    options: Vec<MockElement>,
}

impl MockSelect {
    /// Wrap `element`; three placeholder options are created per wrap
    #[must_use]
    pub fn new(element: MockElement) -> Self {
        let options = (1..=3)
            .map(|i| MockElement::new("option", format!("Option {i}"), element.sink().clone()))
            .collect();
        Self { element, options }
    }

    /// The wrapped element
    #[must_use]
    pub const fn element(&self) -> &MockElement {
        &self.element
    }

    /// Placeholder options
    #[must_use]
    pub fn options(&self) -> &[MockElement] {
        &self.options
    }

    /// Always the first placeholder
    #[must_use]
    pub fn first_selected_option(&self) -> Option<&MockElement> {
        self.options.first()
    }

    /// Always every placeholder
    #[must_use]
    pub fn all_selected_options(&self) -> &[MockElement] {
        &self.options
    }

    fn trace(&self, op: &str, detail: String) {
        self.element.sink().emit(op, 1, detail);
    }

    /// Trace only
    pub fn select_by_value(&self, value: &str) -> &Self {
        self.trace("select_by_value", format!("Selected option by value: {value}"));
        self
    }

    /// Trace only
    pub fn select_by_visible_text(&self, text: &str) -> &Self {
        self.trace(
            "select_by_visible_text",
            format!("Selected option by text: {text}"),
        );
        self
    }

    /// Trace only
    pub fn select_by_index(&self, index: usize) -> &Self {
        self.trace("select_by_index", format!("Selected option by index: {index}"));
        self
    }
}

fn boxed(elements: &[MockElement]) -> Vec<Box<dyn WebElement>> {
    elements
        .iter()
        .map(|e| Box::new(e.clone()) as Box<dyn WebElement>)
        .collect()
}

impl SelectElement for MockSelect {
    fn select_by_value(&self, value: &str) -> DoubleResult<()> {
        let _ = Self::select_by_value(self, value);
        Ok(())
    }

    fn select_by_visible_text(&self, text: &str) -> DoubleResult<()> {
        let _ = Self::select_by_visible_text(self, text);
        Ok(())
    }

    fn select_by_index(&self, index: usize) -> DoubleResult<()> {
        let _ = Self::select_by_index(self, index);
        Ok(())
    }

    fn options(&self) -> DoubleResult<Vec<Box<dyn WebElement>>> {
        Ok(boxed(&self.options))
    }

    fn first_selected_option(&self) -> DoubleResult<Option<Box<dyn WebElement>>> {
        Ok(Self::first_selected_option(self).map(|e| Box::new(e.clone()) as Box<dyn WebElement>))
    }

    fn all_selected_options(&self) -> DoubleResult<Vec<Box<dyn WebElement>>> {
        Ok(boxed(&self.options))
    }
}
