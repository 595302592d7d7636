//! Query clients for the telemetry stores
//!
//! One client per backend, each answering a single question: has the signal
//! this store ingests shown up for our service yet? The clients never retry
//! on their own; callers poll them.
//!
//! - tempo: trace search
//! - prometheus: instant metric query
//! - loki: log range query

pub mod loki;
pub mod prometheus;
pub mod tempo;

pub use loki::LokiClient;
pub use prometheus::PrometheusClient;
pub use tempo::TempoClient;

use chrono::{DateTime, Utc};
use serde_json::Value;

/// How far back the trace and log queries look
pub(crate) const LOOKBACK_MINUTES: i64 = 5;

/// The query window ending now
pub(crate) fn query_window() -> (DateTime<Utc>, DateTime<Utc>) {
    let end = Utc::now();
    (end - chrono::Duration::minutes(LOOKBACK_MINUTES), end)
}

/// Entries under `data.result` of a successful store response
pub(crate) fn result_entries(payload: &Value) -> Option<&Vec<Value>> {
    if payload["status"] != "success" {
        return None;
    }
    payload["data"]["result"].as_array()
}
