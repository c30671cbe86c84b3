//! Expired-token reaper.
//!
//! One pass per scheduled invocation: query the tokens collection for
//! entries expired longer than the TTL, delete each one, report counts.
//! Delete failures are counted and skipped rather than aborting the batch;
//! only a failed query aborts the run.

use std::time::Duration;

use serde_json::json;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::metrics;
use crate::store::Store;
use crate::utils::{now_rfc3339, now_unix};

/// Outcome of one reaper pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReapReport {
    /// Tokens matched by the expiry query.
    pub matched: usize,
    /// Tokens actually deleted.
    pub deleted: usize,
    /// Tokens whose deletion failed.
    pub failed: usize,
}

/// Delete every token whose `expiry` is strictly older than now minus `ttl`.
pub async fn run(
    store: &dyn Store,
    tokens_collection: &str,
    ttl: Duration,
) -> Result<ReapReport, StoreError> {
    let cutoff = now_unix() - ttl.as_secs() as i64;
    info!(collection = tokens_collection, cutoff, "reaping expired tokens");

    let mut report = ReapReport::default();
    let mut last: Option<String> = None;

    loop {
        let page = store
            .query(tokens_collection, json!({ "expiry?lt": cutoff }), last.as_deref())
            .await?;
        report.matched += page.items.len();

        for token in &page.items {
            let Some(key) = token["key"].as_str() else {
                warn!(?token, "token entity without key, skipping");
                report.failed += 1;
                continue;
            };

            match store.delete(tokens_collection, key).await {
                Ok(()) => report.deleted += 1,
                Err(err) => {
                    warn!(key, error = %err, "failed to delete expired token");
                    report.failed += 1;
                }
            }
        }

        if !page.has_more() {
            break;
        }
        last = page.last;
    }

    metrics::add_tokens_reaped(report.deleted as u64);
    info!(
        matched = report.matched,
        deleted = report.deleted,
        failed = report.failed,
        "cleaned up expired tokens"
    );

    Ok(report)
}

/// Emit the liveness heartbeat. A log line only; nothing consumes it.
pub fn send_heartbeat() {
    info!("heartbeat sent at {}", now_rfc3339());
}
