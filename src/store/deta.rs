//! Deta Base HTTP API client.
//!
//! Speaks the Base REST interface directly: one URL root per collection,
//! authenticated with the project key in the `X-API-Key` header.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::Config;
use crate::error::StoreError;
use crate::metrics;

use super::types::Page;
use super::Store;

/// Deta Base client. Cheap to clone; built once at startup and shared.
#[derive(Debug, Clone)]
pub struct DetaStore {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Base API root (no trailing slash).
    base_url: String,
    /// Project id, the prefix of the project key.
    project_id: String,
    /// Full project key, sent as `X-API-Key`.
    project_key: String,
}

impl DetaStore {
    /// Create a new Deta Base client from config.
    ///
    /// Fails when the project key does not carry a project id; intended to
    /// be fatal at startup rather than surfaced per request.
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        let project_id = config
            .project_id()
            .ok_or_else(|| {
                StoreError::InvalidProjectKey(
                    "expected <project_id>_<secret>".to_string(),
                )
            })?
            .to_string();

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.http_timeout_ms))
            .connect_timeout(std::time::Duration::from_millis(2_000))
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http,
            base_url: config.deta_base_url.trim_end_matches('/').to_string(),
            project_id,
            project_key: config.deta_project_key.clone(),
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.project_id, collection)
    }

    /// Turn a non-success response into a [`StoreError::RequestFailed`].
    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let detail = resp.text().await.unwrap_or_default();
        Err(StoreError::RequestFailed {
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl Store for DetaStore {
    async fn put(&self, collection: &str, item: Value) -> Result<String, StoreError> {
        let start = Instant::now();
        let url = format!("{}/items", self.collection_url(collection));

        let resp = self
            .http
            .put(&url)
            .header("X-API-Key", &self.project_key)
            .json(&json!({ "items": [item] }))
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;

        // Base answers 207 with processed/failed item lists.
        let body: Value = resp.json().await?;
        metrics::record_store_latency(start, "put");

        let key = body
            .pointer("/processed/items/0/key")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                StoreError::InvalidResponse(format!(
                    "put response carried no processed key: {body}"
                ))
            })?;

        debug!(collection, key, "stored entity");
        Ok(key.to_string())
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let start = Instant::now();
        let url = format!("{}/items/{}", self.collection_url(collection), key);

        let resp = self
            .http
            .get(&url)
            .header("X-API-Key", &self.project_key)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            metrics::record_store_latency(start, "get");
            return Ok(None);
        }

        let resp = Self::check_status(resp).await?;
        let item: Value = resp.json().await?;
        metrics::record_store_latency(start, "get");
        Ok(Some(item))
    }

    async fn query(
        &self,
        collection: &str,
        filter: Value,
        last: Option<&str>,
    ) -> Result<Page, StoreError> {
        let start = Instant::now();
        let url = format!("{}/query", self.collection_url(collection));

        let mut body = json!({ "query": [filter] });
        if let Some(cursor) = last {
            body["last"] = json!(cursor);
        }

        let resp = self
            .http
            .post(&url)
            .header("X-API-Key", &self.project_key)
            .json(&body)
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;

        let body: Value = resp.json().await?;
        metrics::record_store_latency(start, "query");

        let items = body
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| {
                StoreError::InvalidResponse("query response carried no items array".to_string())
            })?;
        let last = body
            .pointer("/paging/last")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Page { items, last })
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        let start = Instant::now();
        let url = format!("{}/items/{}", self.collection_url(collection), key);

        let resp = self
            .http
            .delete(&url)
            .header("X-API-Key", &self.project_key)
            .send()
            .await?;
        // Base answers 200 for missing keys as well; only transport or auth
        // failures surface here.
        Self::check_status(resp).await?;
        metrics::record_store_latency(start, "delete");

        debug!(collection, key, "deleted entity");
        Ok(())
    }
}
