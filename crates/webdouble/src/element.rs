//! In-memory stand-in for a single UI node.
//!
//! A [`MockElement`] is a cheap handle: clones point at the same node, which
//! is what makes the driver's lookup cache identity-preserving.

use crate::driver::WebElement;
use crate::locator::Locator;
use crate::result::DoubleResult;
use crate::trace::TraceSink;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an element handle's underlying node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl ElementId {
    fn next() -> Self {
        Self(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element-{}", self.0)
    }
}

/// Well-known attribute keys
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrKey {
    /// Current input value
    Value,
    /// Selection state (checkbox, radio, option)
    Selected,
    /// Enabled flag
    Enabled,
    /// Visibility flag
    Visible,
    /// Any other attribute
    Other(String),
}

impl AttrKey {
    /// Classify an attribute name
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "value" => Self::Value,
            "selected" | "checked" => Self::Selected,
            "enabled" => Self::Enabled,
            "visible" => Self::Visible,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Typed attribute store of a mock node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementAttributes {
    /// Current input value
    pub value: String,
    /// Selection state
    pub selected: bool,
    /// Enabled flag
    pub enabled: bool,
    /// Visibility flag
    pub visible: bool,
    /// Everything else
    pub extra: HashMap<String, String>,
}

impl Default for ElementAttributes {
    fn default() -> Self {
        Self {
            value: String::new(),
            selected: false,
            enabled: true,
            visible: true,
            extra: HashMap::new(),
        }
    }
}

impl ElementAttributes {
    /// Read an attribute as text; absent attributes read as `""`
    #[must_use]
    pub fn get(&self, key: &AttrKey) -> String {
        let flag = |on: bool| if on { "true".to_string() } else { String::new() };
        match key {
            AttrKey::Value => self.value.clone(),
            AttrKey::Selected => flag(self.selected),
            AttrKey::Enabled => flag(self.enabled),
            AttrKey::Visible => flag(self.visible),
            AttrKey::Other(name) => self.extra.get(name).cloned().unwrap_or_default(),
        }
    }

    /// Write an attribute; boolean keys accept `"true"`/`"false"`
    pub fn set(&mut self, key: AttrKey, value: &str) {
        let truthy = ["true", "1", "yes", "selected", "checked"]
            .iter()
            .any(|t| t.eq_ignore_ascii_case(value.trim()));
        match key {
            AttrKey::Value => self.value = value.to_string(),
            AttrKey::Selected => self.selected = truthy,
            AttrKey::Enabled => self.enabled = truthy,
            AttrKey::Visible => self.visible = truthy,
            AttrKey::Other(name) => {
                let _ = self.extra.insert(name, value.to_string());
            }
        }
    }
}

#[derive(Debug)]
struct ElementState {
    tag_name: String,
    text: String,
    locator: Option<Locator>,
    attributes: ElementAttributes,
}

/// Stateful stand-in for a DOM node
#[derive(Clone)]
pub struct MockElement {
    id: ElementId,
    state: Arc<Mutex<ElementState>>,
    sink: TraceSink,
    depth: usize,
}

impl fmt::Debug for MockElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("MockElement")
            .field("id", &self.id)
            .field("tag_name", &state.tag_name)
            .field("text", &state.text)
            .field("locator", &state.locator)
            .finish()
    }
}

impl MockElement {
    /// Create a node with the given tag and text
    #[must_use]
    pub fn new(tag_name: impl Into<String>, text: impl Into<String>, sink: TraceSink) -> Self {
        Self {
            id: ElementId::next(),
            state: Arc::new(Mutex::new(ElementState {
                tag_name: tag_name.into(),
                text: text.into(),
                locator: None,
                attributes: ElementAttributes::default(),
            })),
            sink,
            depth: 1,
        }
    }

    /// Record the locator this node was found by
    #[must_use]
    pub fn with_locator(self, locator: Locator) -> Self {
        self.state().locator = Some(locator);
        self
    }

    #[must_use]
    pub(crate) const fn at_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    fn state(&self) -> MutexGuard<'_, ElementState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn trace(&self, op: &str, detail: impl Into<String>) {
        self.sink.emit(op, self.depth, detail);
    }

    /// Node identity
    #[must_use]
    pub const fn id(&self) -> ElementId {
        self.id
    }

    /// Whether two handles point at the same node
    #[must_use]
    pub fn same_node(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Trace sink shared with the owning driver
    #[must_use]
    pub const fn sink(&self) -> &TraceSink {
        &self.sink
    }

    /// Tag category (`div`, `td`, `option`, ...)
    #[must_use]
    pub fn tag_name(&self) -> String {
        self.state().tag_name.clone()
    }

    /// Display text
    #[must_use]
    pub fn text(&self) -> String {
        self.state().text.clone()
    }

    /// Locator this node was found by, if any
    #[must_use]
    pub fn locator(&self) -> Option<Locator> {
        self.state().locator.clone()
    }

    /// Snapshot of the attribute store
    #[must_use]
    pub fn attributes(&self) -> ElementAttributes {
        self.state().attributes.clone()
    }

    /// Current input value
    #[must_use]
    pub fn value(&self) -> String {
        self.state().attributes.value.clone()
    }

    /// Click; no state change beyond the trace
    pub fn click(&self) -> &Self {
        let text = self.text();
        self.trace("click", format!("Clicked element: {text}"));
        self
    }

    /// Replace the value with the concatenation of `parts`
    pub fn send_keys(&self, parts: &[&str]) -> &Self {
        let text = parts.concat();
        self.state().attributes.value.clone_from(&text);
        self.trace("send_keys", format!("Sent keys to element: {text}"));
        self
    }

    /// Reset the value to empty
    pub fn clear(&self) -> &Self {
        self.state().attributes.value.clear();
        self.trace("clear", "Cleared element");
        self
    }

    /// Submit the enclosing form
    pub fn submit(&self) -> &Self {
        self.trace("submit", "Submitted form");
        self
    }

    /// Read an attribute; never fails, absent reads as `""`
    #[must_use]
    pub fn get_attribute(&self, name: &str) -> String {
        self.state().attributes.get(&AttrKey::parse(name))
    }

    /// Write an attribute
    pub fn set_attribute(&self, name: &str, value: &str) -> &Self {
        self.state().attributes.set(AttrKey::parse(name), value);
        self
    }

    /// Set the selection flag
    pub fn set_selected(&self, selected: bool) -> &Self {
        self.state().attributes.selected = selected;
        self
    }

    /// Set the visibility flag
    pub fn set_visible(&self, visible: bool) -> &Self {
        self.state().attributes.visible = visible;
        self
    }

    /// Set the enabled flag
    pub fn set_enabled(&self, enabled: bool) -> &Self {
        self.state().attributes.enabled = enabled;
        self
    }

    /// Visibility flag (defaults to true)
    #[must_use]
    pub fn is_displayed(&self) -> bool {
        self.state().attributes.visible
    }

    /// Enabled flag (defaults to true)
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.state().attributes.enabled
    }

    /// Selection flag (defaults to false)
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.state().attributes.selected
    }

    /// A fresh child node; children are never cached
    #[must_use]
    pub fn find_element(&self, locator: &Locator) -> Self {
        self.sink.emit(
            "find_child_element",
            self.depth + 1,
            format!("Found child element: {locator}"),
        );
        Self::new("div", "Mock Element", self.sink.clone())
            .with_locator(locator.clone())
            .at_depth(self.depth + 1)
    }

    /// Three fresh `td` children
    #[must_use]
    pub fn find_elements(&self, locator: &Locator) -> Vec<Self> {
        self.sink.emit(
            "find_child_elements",
            self.depth + 1,
            format!("Found child elements: {locator} (returning 3 mock elements)"),
        );
        (1..=3)
            .map(|i| Self::new("td", format!("Cell {i}"), self.sink.clone()).at_depth(self.depth + 1))
            .collect()
    }
}

impl WebElement for MockElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn tag_name(&self) -> DoubleResult<String> {
        Ok(Self::tag_name(self))
    }

    fn text(&self) -> DoubleResult<String> {
        Ok(Self::text(self))
    }

    fn click(&self) -> DoubleResult<()> {
        let _ = Self::click(self);
        Ok(())
    }

    fn send_keys(&self, parts: &[&str]) -> DoubleResult<()> {
        let _ = Self::send_keys(self, parts);
        Ok(())
    }

    fn clear(&self) -> DoubleResult<()> {
        let _ = Self::clear(self);
        Ok(())
    }

    fn submit(&self) -> DoubleResult<()> {
        let _ = Self::submit(self);
        Ok(())
    }

    fn get_attribute(&self, name: &str) -> DoubleResult<String> {
        Ok(Self::get_attribute(self, name))
    }

    fn is_displayed(&self) -> DoubleResult<bool> {
        Ok(Self::is_displayed(self))
    }

    fn is_enabled(&self) -> DoubleResult<bool> {
        Ok(Self::is_enabled(self))
    }

    fn is_selected(&self) -> DoubleResult<bool> {
        Ok(Self::is_selected(self))
    }

    fn find_element(&self, locator: &Locator) -> DoubleResult<Box<dyn WebElement>> {
        Ok(Box::new(Self::find_element(self, locator)))
    }

    fn find_elements(&self, locator: &Locator) -> DoubleResult<Vec<Box<dyn WebElement>>> {
        Ok(Self::find_elements(self, locator)
            .into_iter()
            .map(|e| Box::new(e) as Box<dyn WebElement>)
            .collect())
    }

    fn boxed_clone(&self) -> Box<dyn WebElement> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
