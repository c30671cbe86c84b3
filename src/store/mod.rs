//! Key-value store abstraction over the external backend.
//!
//! Handlers and the token reaper only see the [`Store`] trait; the real
//! backend is Deta Base ([`DetaStore`]), with an in-memory implementation
//! ([`MemoryStore`]) for tests.

pub mod deta;
pub mod memory;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

pub use deta::DetaStore;
pub use memory::{MemoryConfig, MemoryStore};
pub use types::Page;

/// Schema-less key-value store with filtered, paginated queries.
///
/// Entities are JSON objects keyed by a store-generated string. Collections
/// are independent namespaces ("medical-records", "tokens").
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert an entity; returns the store-generated key.
    async fn put(&self, collection: &str, item: Value) -> Result<String, StoreError>;

    /// Point read by key. `Ok(None)` when no entity exists for the key.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError>;

    /// Filtered scan, one page per call.
    ///
    /// `filter` uses the Deta map form: `{"field": v}` for equality and
    /// `{"field?lt": n}` (`?lte`, `?gt`, `?gte`) for numeric comparisons.
    /// An empty object matches everything. Pass the previous page's `last`
    /// cursor to continue a scan.
    async fn query(
        &self,
        collection: &str,
        filter: Value,
        last: Option<&str>,
    ) -> Result<Page, StoreError>;

    /// Delete by key. Deleting a missing key is not an error.
    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError>;
}
