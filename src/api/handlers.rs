//! HTTP API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;
use uuid::Uuid;

use crate::error::StoreError;
use crate::metrics;
use crate::store::Store;
use crate::utils::now_rfc3339;

/// Application state shared with handlers.
///
/// Built once at startup; handlers hold no other state.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend.
    pub store: Arc<dyn Store>,
    /// Collection holding records and sync payloads.
    pub records_collection: String,
    /// Prometheus render handle, when the recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state over a store.
    pub fn new(store: Arc<dyn Store>, records_collection: impl Into<String>) -> Self {
        Self {
            store,
            records_collection: records_collection.into(),
            metrics: None,
        }
    }

    /// Attach a Prometheus render handle for the /metrics endpoint.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// API-level error, mapped to an HTTP response.
///
/// Backend detail never reaches the caller; it is logged server-side under
/// an opaque error id that the caller can quote back.
#[derive(Debug)]
pub enum ApiError {
    /// No entity exists for the requested id.
    NotFound,
    /// The storage backend failed.
    Backend(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Backend(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "record not found" })),
            )
                .into_response(),
            Self::Backend(err) => {
                let error_id = Uuid::new_v4();
                error!(%error_id, error = %err, "store operation failed");
                metrics::inc_store_failures();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "storage backend failure",
                        "error_id": error_id.to_string(),
                    })),
                )
                    .into_response()
            }
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "healthy".
    pub status: &'static str,
    /// Server time, RFC 3339.
    pub timestamp: String,
}

/// Store request: a caller-encrypted record.
#[derive(Debug, Deserialize)]
pub struct StoreRequest {
    /// Opaque ciphertext blob; never inspected.
    pub encrypted: Value,
    /// Caller-defined timestamp.
    pub timestamp: i64,
    /// Caller-defined category label.
    #[serde(rename = "type")]
    pub record_type: String,
}

/// Store response.
#[derive(Debug, Serialize)]
pub struct StoreResponse {
    /// Always true on success.
    pub success: bool,
    /// Store-generated key for the new record.
    pub id: String,
}

/// Retrieve request.
#[derive(Debug, Deserialize)]
pub struct RetrieveRequest {
    /// Key returned by a previous store call.
    pub id: String,
}

/// Sync response. Deliberately carries no id: sync payloads are
/// write-only from the caller's point of view.
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    /// Always true on success.
    pub success: bool,
}

/// Stats response.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Entity count across the records collection.
    pub total_records: usize,
    /// Server time, RFC 3339.
    pub timestamp: String,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        timestamp: now_rfc3339(),
    })
}

/// Store a caller-encrypted record; returns its generated id.
pub async fn store(
    State(state): State<AppState>,
    Json(req): Json<StoreRequest>,
) -> Result<Json<StoreResponse>, ApiError> {
    let item = json!({
        "kind": "record",
        "encrypted": req.encrypted,
        "timestamp": req.timestamp,
        "type": req.record_type,
        "created_at": now_rfc3339(),
    });

    let id = state.store.put(&state.records_collection, item).await?;
    metrics::inc_records_stored();

    Ok(Json(StoreResponse { success: true, id }))
}

/// Fetch a stored entity by id, verbatim.
pub async fn retrieve(
    State(state): State<AppState>,
    Json(req): Json<RetrieveRequest>,
) -> Result<Json<Value>, ApiError> {
    let item = state
        .store
        .get(&state.records_collection, &req.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    metrics::inc_records_retrieved();

    Ok(Json(item))
}

/// Persist an arbitrary sync payload alongside records.
pub async fn sync(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<SyncResponse>, ApiError> {
    let item = json!({
        "kind": "sync",
        "payload": payload,
        "synced_at": now_rfc3339(),
    });

    state.store.put(&state.records_collection, item).await?;
    metrics::inc_sync_payloads();

    Ok(Json(SyncResponse { success: true }))
}

/// Count all entities in the records collection via a paginated scan.
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let mut total_records = 0;
    let mut last: Option<String> = None;

    loop {
        let page = state
            .store
            .query(&state.records_collection, json!({}), last.as_deref())
            .await?;
        total_records += page.items.len();
        if !page.has_more() {
            break;
        }
        last = page.last;
    }

    Ok(Json(StatsResponse {
        total_records,
        timestamp: now_rfc3339(),
    }))
}

/// Render Prometheus metrics; empty when no recorder is installed.
pub async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.as_ref().map(|h| h.render()).unwrap_or_default()
}
