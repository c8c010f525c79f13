//! Trace output of the mock layer.
//!
//! Each mock operation produces one [`TraceEvent`]. Events are recorded in a
//! history shared by a driver and every element it hands out, forwarded to
//! `tracing`, and echoed to stdout as `[MOCK] ...` lines when echo is on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Prefix carried by every echoed trace line
pub const TRACE_TAG: &str = "[MOCK]";

/// One traced mock operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Operation name (e.g. `find_element`)
    pub op: String,
    /// Human-readable detail
    pub detail: String,
    /// Nesting depth: 0 driver, 1 element, 2 child element
    pub depth: usize,
}

impl TraceEvent {
    /// Create a new event
    #[must_use]
    pub fn new(op: impl Into<String>, detail: impl Into<String>, depth: usize) -> Self {
        Self {
            op: op.into(),
            detail: detail.into(),
            depth,
        }
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:indent$}{TRACE_TAG} {}",
            "",
            self.detail,
            indent = self.depth * 2
        )
    }
}

/// Shared recorder for trace events
#[derive(Debug, Clone)]
pub struct TraceSink {
    events: Arc<Mutex<Vec<TraceEvent>>>,
    echo: bool,
}

impl Default for TraceSink {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TraceSink {
    /// Create a sink; `echo` controls printing to stdout
    #[must_use]
    pub fn new(echo: bool) -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            echo,
        }
    }

    /// A sink that records without printing
    #[must_use]
    pub fn silent() -> Self {
        Self::new(false)
    }

    /// Whether lines are printed to stdout
    #[must_use]
    pub const fn echoes(&self) -> bool {
        self.echo
    }

    /// Record an operation
    pub fn emit(&self, op: &str, depth: usize, detail: impl Into<String>) {
        let event = TraceEvent::new(op, detail, depth);
        tracing::debug!(target: "webdouble::mock", op = %event.op, depth, "{}", event.detail);
        if self.echo {
            println!("{event}");
        }
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Snapshot of recorded events
    #[must_use]
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rendered lines, as they would be echoed
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.events().iter().map(ToString::to_string).collect()
    }

    /// Number of recorded events for `op`
    #[must_use]
    pub fn count(&self, op: &str) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.op == op)
            .count()
    }

    /// Drop recorded events
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_indentation_by_depth() {
        assert_eq!(
            TraceEvent::new("get", "Navigated to: x", 0).to_string(),
            "[MOCK] Navigated to: x"
        );
        assert_eq!(
            TraceEvent::new("click", "Clicked element: y", 1).to_string(),
            "  [MOCK] Clicked element: y"
        );
        assert_eq!(
            TraceEvent::new("find_element", "Found child element", 2).to_string(),
            "    [MOCK] Found child element"
        );
    }

    #[test]
    fn test_clones_share_history() {
        let sink = TraceSink::silent();
        let other = sink.clone();
        other.emit("click", 1, "Clicked element: a");
        sink.emit("clear", 1, "Cleared element");
        assert_eq!(sink.events().len(), 2);
        assert_eq!(other.count("click"), 1);
    }

    #[test]
    fn test_clear_empties_history() {
        let sink = TraceSink::silent();
        sink.emit("quit", 0, "WebDriver quit");
        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_every_line_carries_tag() {
        let sink = TraceSink::silent();
        sink.emit("get", 0, "Navigated to: about:blank");
        sink.emit("send_keys", 1, "Sent keys to element: x");
        assert!(sink.lines().iter().all(|l| l.trim_start().starts_with(TRACE_TAG)));
    }

    #[test]
    fn test_default_sink_echoes() {
        assert!(TraceSink::default().echoes());
        assert!(!TraceSink::silent().echoes());
    }
}
