//! HTTP API route definitions.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers::{health, render_metrics, retrieve, stats, store, sync, AppState};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/store", post(store))
        .route("/retrieve", post(retrieve))
        .route("/sync", post(sync))
        .route("/stats", get(stats))
        .route("/metrics", get(render_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use time::format_description::well_known::Rfc3339;
    use time::OffsetDateTime;
    use tower::ServiceExt;

    use crate::store::{MemoryConfig, MemoryStore, Store};

    const RECORDS: &str = "medical-records";

    fn app(store: Arc<MemoryStore>) -> Router {
        create_router(AppState::new(store, RECORDS))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_returns_healthy_with_timestamp() {
        let response = app(Arc::new(MemoryStore::new()))
            .oneshot(get_request("/health"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn store_then_retrieve_round_trips_record_fields() {
        let store = Arc::new(MemoryStore::new());
        // Whole-second floor; created_at may carry sub-second precision.
        let before = OffsetDateTime::now_utc().replace_nanosecond(0).unwrap();

        let response = app(store.clone())
            .oneshot(post_json(
                "/store",
                json!({
                    "encrypted": {"iv": "AAAA", "data": "xywz=="},
                    "timestamp": 1_700_000_000,
                    "type": "prescription",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], json!(true));
        let id = body["id"].as_str().unwrap().to_string();

        let response = app(store)
            .oneshot(post_json("/retrieve", json!({ "id": id })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let record = body_json(response).await;
        assert_eq!(record["encrypted"], json!({"iv": "AAAA", "data": "xywz=="}));
        assert_eq!(record["timestamp"], json!(1_700_000_000));
        assert_eq!(record["type"], "prescription");
        assert_eq!(record["kind"], "record");
        let created_at = OffsetDateTime::parse(record["created_at"].as_str().unwrap(), &Rfc3339)
            .expect("created_at is valid RFC 3339");
        assert!(created_at >= before);
    }

    #[tokio::test]
    async fn retrieve_unknown_id_is_not_found() {
        let response = app(Arc::new(MemoryStore::new()))
            .oneshot(post_json("/retrieve", json!({ "id": "never-stored" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "record not found");
    }

    #[tokio::test]
    async fn store_failure_returns_opaque_500() {
        let store = Arc::new(MemoryStore::with_config(MemoryConfig {
            fail_put: true,
            ..Default::default()
        }));

        let response = app(store)
            .oneshot(post_json(
                "/store",
                json!({ "encrypted": {}, "timestamp": 0, "type": "note" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "storage backend failure");
        assert!(body["error_id"].is_string());
        // No backend detail leaks through.
        assert!(!body.to_string().contains("simulated"));
    }

    #[tokio::test]
    async fn sync_persists_but_returns_no_id() {
        let store = Arc::new(MemoryStore::new());

        let response = app(store.clone())
            .oneshot(post_json("/sync", json!({ "device": "phone", "seq": 7 })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body, json!({ "success": true }));
        assert_eq!(store.len(RECORDS), 1);
    }

    #[tokio::test]
    async fn stats_counts_all_entities() {
        for n in [0usize, 1, 5] {
            let store = Arc::new(MemoryStore::with_config(MemoryConfig {
                // Small pages so counting crosses page boundaries.
                page_size: Some(2),
                ..Default::default()
            }));
            for i in 0..n {
                store
                    .put(
                        RECORDS,
                        json!({ "kind": "record", "encrypted": {}, "timestamp": i }),
                    )
                    .await
                    .unwrap();
            }

            let response = app(store).oneshot(get_request("/stats")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = body_json(response).await;
            assert_eq!(body["total_records"], json!(n));
            assert!(body["timestamp"].is_string());
        }
    }

    #[tokio::test]
    async fn stats_failure_returns_opaque_500() {
        let store = Arc::new(MemoryStore::with_config(MemoryConfig {
            fail_query: true,
            ..Default::default()
        }));

        let response = app(store).oneshot(get_request("/stats")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn metrics_endpoint_responds_without_recorder() {
        let response = app(Arc::new(MemoryStore::new()))
            .oneshot(get_request("/metrics"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
