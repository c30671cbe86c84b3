//! In-memory store for unit testing.
//!
//! Implements the same contract as the Deta client, including the map-form
//! filter syntax, without network access. Failure injection lets tests
//! exercise the backend-failure paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

use super::types::Page;
use super::Store;

/// Configuration for mock store behavior.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfig {
    /// Whether to fail put requests.
    pub fail_put: bool,
    /// Whether to fail get requests.
    pub fail_get: bool,
    /// Whether to fail query requests.
    pub fail_query: bool,
    /// Whether to fail delete requests.
    pub fail_delete: bool,
    /// Keys whose deletion fails even when `fail_delete` is off.
    pub fail_delete_keys: Vec<String>,
    /// Page size for queries; `None` returns everything in one page.
    pub page_size: Option<usize>,
}

/// In-memory store keyed by collection name.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    config: MemoryConfig,
    // BTreeMap keeps key order stable for pagination cursors.
    collections: Arc<Mutex<BTreeMap<String, BTreeMap<String, Value>>>>,
    next_key: Arc<AtomicU64>,
}

impl MemoryStore {
    /// Create an empty store with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with custom configuration.
    pub fn with_config(config: MemoryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Number of entities currently in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Whether a collection holds no entities.
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn injected(op: &'static str) -> StoreError {
        StoreError::RequestFailed {
            status: 500,
            detail: format!("simulated {op} failure"),
        }
    }
}

/// Match an entity against a map-form filter (`{"field?op": value}`).
fn matches_filter(item: &Value, filter: &Value) -> bool {
    let Some(clauses) = filter.as_object() else {
        return false;
    };

    clauses.iter().all(|(expr, expected)| {
        let (field, op) = match expr.split_once('?') {
            Some((field, op)) => (field, op),
            None => (expr.as_str(), "eq"),
        };
        let actual = &item[field];

        match op {
            "eq" => actual == expected,
            "lt" | "lte" | "gt" | "gte" => {
                let (Some(a), Some(b)) = (actual.as_f64(), expected.as_f64()) else {
                    return false;
                };
                match op {
                    "lt" => a < b,
                    "lte" => a <= b,
                    "gt" => a > b,
                    _ => a >= b,
                }
            }
            _ => false,
        }
    })
}

#[async_trait]
impl Store for MemoryStore {
    async fn put(&self, collection: &str, mut item: Value) -> Result<String, StoreError> {
        if self.config.fail_put {
            return Err(Self::injected("put"));
        }

        if !item.is_object() {
            return Err(StoreError::RequestFailed {
                status: 400,
                detail: "item must be a JSON object".to_string(),
            });
        }

        // Like the real backend, a caller-supplied key wins over generation.
        let key = match item.get("key").and_then(Value::as_str) {
            Some(key) => key.to_string(),
            None => {
                let n = self.next_key.fetch_add(1, Ordering::SeqCst) + 1;
                let key = format!("mem{n:08}");
                item["key"] = Value::String(key.clone());
                key
            }
        };

        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .insert(key.clone(), item);

        Ok(key)
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        if self.config.fail_get {
            return Err(Self::injected("get"));
        }

        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .and_then(|items| items.get(key))
            .cloned())
    }

    async fn query(
        &self,
        collection: &str,
        filter: Value,
        last: Option<&str>,
    ) -> Result<Page, StoreError> {
        if self.config.fail_query {
            return Err(Self::injected("query"));
        }

        let collections = self.collections.lock().unwrap();
        let matched: Vec<&Value> = collections
            .get(collection)
            .into_iter()
            .flat_map(BTreeMap::values)
            .filter(|item| matches_filter(item, &filter))
            .collect();

        // Resume after the cursor key, mirroring backend paging.
        let skip = match last {
            Some(cursor) => matched
                .iter()
                .position(|item| item["key"].as_str() == Some(cursor))
                .map_or(0, |i| i + 1),
            None => 0,
        };
        let page_size = self.config.page_size.unwrap_or(usize::MAX);

        let items: Vec<Value> = matched
            .iter()
            .skip(skip)
            .take(page_size)
            .map(|v| (*v).clone())
            .collect();
        let last = if skip + items.len() < matched.len() {
            items
                .last()
                .and_then(|item| item["key"].as_str())
                .map(str::to_string)
        } else {
            None
        };

        Ok(Page { items, last })
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        if self.config.fail_delete || self.config.fail_delete_keys.iter().any(|k| k == key) {
            return Err(Self::injected("delete"));
        }

        if let Some(items) = self.collections.lock().unwrap().get_mut(collection) {
            items.remove(key);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn put_generates_key_and_get_round_trips() {
        let store = MemoryStore::new();
        let key = store
            .put("records", json!({"type": "lab-result"}))
            .await
            .unwrap();

        let item = store.get("records", &key).await.unwrap().unwrap();
        assert_eq!(item["type"], "lab-result");
        assert_eq!(item["key"], json!(key));
    }

    #[tokio::test]
    async fn put_honors_caller_supplied_key() {
        let store = MemoryStore::new();
        let key = store
            .put("tokens", json!({"key": "tok-1", "expiry": 5}))
            .await
            .unwrap();
        assert_eq!(key, "tok-1");
    }

    #[tokio::test]
    async fn get_missing_key_is_none() {
        let store = MemoryStore::new();
        assert!(store.get("records", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn query_lt_filter_matches_numeric_field() {
        let store = MemoryStore::new();
        for (key, expiry) in [("a", 10), ("b", 20), ("c", 30)] {
            store
                .put("tokens", json!({"key": key, "expiry": expiry}))
                .await
                .unwrap();
        }

        let page = store
            .query("tokens", json!({"expiry?lt": 25}), None)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.last.is_none());
    }

    #[tokio::test]
    async fn query_paginates_with_cursor() {
        let store = MemoryStore::with_config(MemoryConfig {
            page_size: Some(2),
            ..Default::default()
        });
        for i in 0..5 {
            store.put("records", json!({"n": i})).await.unwrap();
        }

        let mut seen = 0;
        let mut last: Option<String> = None;
        loop {
            let page = store
                .query("records", json!({}), last.as_deref())
                .await
                .unwrap();
            seen += page.items.len();
            if !page.has_more() {
                break;
            }
            last = page.last;
        }
        assert_eq!(seen, 5);
    }

    #[tokio::test]
    async fn delete_removes_entity_and_is_idempotent() {
        let store = MemoryStore::new();
        let key = store.put("records", json!({"x": 1})).await.unwrap();

        store.delete("records", &key).await.unwrap();
        assert!(store.get("records", &key).await.unwrap().is_none());
        store.delete("records", &key).await.unwrap();
    }

    #[tokio::test]
    async fn failure_injection_fails_matching_ops() {
        let store = MemoryStore::with_config(MemoryConfig {
            fail_put: true,
            ..Default::default()
        });
        assert!(store.put("records", json!({})).await.is_err());
    }
}
