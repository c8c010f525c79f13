//! Locators: how an element is found.
//!
//! A [`Locator`] is a `(strategy, value)` pair. The mock layer treats it as an
//! opaque cache key; only real backends translate it into a CSS query.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default polling interval used by real backends while waiting for elements (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Lookup strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum By {
    /// Element `id` attribute
    Id,
    /// CSS selector (e.g. `#userTable tbody tr`)
    CssSelector,
    /// Tag name (e.g. `option`)
    TagName,
}

impl By {
    /// Strategy name as used in locator keys
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::CssSelector => "css selector",
            Self::TagName => "tag name",
        }
    }
}

impl fmt::Display for By {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable `(strategy, value)` pair identifying an element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    /// Strategy
    pub by: By,
    /// Strategy-specific value
    pub value: String,
}

impl Locator {
    /// Create a locator from a strategy and value
    #[must_use]
    pub fn new(by: By, value: impl Into<String>) -> Self {
        Self {
            by,
            value: value.into(),
        }
    }

    /// Locate by `id`
    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::new(By::Id, value)
    }

    /// Locate by CSS selector
    #[must_use]
    pub fn css(value: impl Into<String>) -> Self {
        Self::new(By::CssSelector, value)
    }

    /// Locate by tag name
    #[must_use]
    pub fn tag(value: impl Into<String>) -> Self {
        Self::new(By::TagName, value)
    }

    /// Cache key in `strategy:value` form
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}", self.by, self.value)
    }

    /// Convert to a CSS selector for backends that only speak CSS
    #[must_use]
    pub fn to_css(&self) -> String {
        match self.by {
            By::Id => format!("[id={}]", css_string(&self.value)),
            By::CssSelector | By::TagName => self.value.clone(),
        }
    }
}

/// Quote a value as a CSS string literal
fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            // Control characters become hex escapes closed by a space
            c if c.is_control() => {
                out.push_str(&format!("\\{:x} ", u32::from(c)));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.by, self.value)
    }
}

impl From<(By, &str)> for Locator {
    fn from((by, value): (By, &str)) -> Self {
        Self::new(by, value)
    }
}
