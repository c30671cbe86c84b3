//! Prometheus metrics for request counts and store latency.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

// === Metric Name Constants ===

/// Records stored counter metric name.
pub const METRIC_RECORDS_STORED: &str = "records_stored_total";
/// Records retrieved counter metric name.
pub const METRIC_RECORDS_RETRIEVED: &str = "records_retrieved_total";
/// Sync payloads stored counter metric name.
pub const METRIC_SYNC_PAYLOADS: &str = "sync_payloads_total";
/// Store failures counter metric name.
pub const METRIC_STORE_FAILURES: &str = "store_failures_total";
/// Tokens reaped counter metric name.
pub const METRIC_TOKENS_REAPED: &str = "tokens_reaped_total";
/// Store request latency metric name.
pub const METRIC_STORE_REQUEST_LATENCY: &str = "store_request_latency_ms";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_counter!(METRIC_RECORDS_STORED, "Total number of records stored");
    describe_counter!(
        METRIC_RECORDS_RETRIEVED,
        "Total number of records retrieved"
    );
    describe_counter!(METRIC_SYNC_PAYLOADS, "Total number of sync payloads stored");
    describe_counter!(
        METRIC_STORE_FAILURES,
        "Total number of failed store operations surfaced to callers"
    );
    describe_counter!(METRIC_TOKENS_REAPED, "Total number of expired tokens deleted");
    describe_histogram!(
        METRIC_STORE_REQUEST_LATENCY,
        "Store backend request latency in milliseconds"
    );

    debug!("Metrics initialized");
}

/// Record a store backend request latency for the given operation.
pub fn record_store_latency(start: Instant, op: &'static str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_STORE_REQUEST_LATENCY, "op" => op).record(latency_ms);
}

/// Increment records stored counter.
pub fn inc_records_stored() {
    counter!(METRIC_RECORDS_STORED).increment(1);
}

/// Increment records retrieved counter.
pub fn inc_records_retrieved() {
    counter!(METRIC_RECORDS_RETRIEVED).increment(1);
}

/// Increment sync payloads counter.
pub fn inc_sync_payloads() {
    counter!(METRIC_SYNC_PAYLOADS).increment(1);
}

/// Increment store failures counter.
pub fn inc_store_failures() {
    counter!(METRIC_STORE_FAILURES).increment(1);
}

/// Add to the tokens reaped counter.
pub fn add_tokens_reaped(count: u64) {
    counter!(METRIC_TOKENS_REAPED).increment(count);
}
