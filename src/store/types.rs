//! Shared store types.

use serde_json::Value;

/// One page of query results.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Matched entities in this page.
    pub items: Vec<Value>,
    /// Cursor for the next page; `None` when the scan is complete.
    pub last: Option<String>,
}

impl Page {
    /// Whether another page follows this one.
    pub fn has_more(&self) -> bool {
        self.last.is_some()
    }
}
