use axum::extract::{Query, State};
use axum::Json;
use opentelemetry::KeyValue;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

use crate::config::Config;
use crate::error::AppError;
use crate::metrics::AppMetrics;
use crate::telemetry::current_trace_id;

/// Shared state for the demo handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub metrics: AppMetrics,
}

#[derive(Debug, Deserialize)]
pub struct WorkParams {
    pub ms: Option<i64>,
}

/// Handle `GET /`
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let started = Instant::now();
    let service = state.config.telemetry.service_name.clone();

    let span = tracing::info_span!("root-handler", endpoint = "/");
    let body = async {
        tracing::info!(trace_id = %current_trace_id(), "hello from {}", service);
        json!({ "ok": true, "msg": format!("Hello from {}", service) })
    }
    .instrument(span)
    .await;

    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    state.metrics.requests.add(1, &[]);
    state
        .metrics
        .latency
        .record(elapsed_ms, &[KeyValue::new("route", "/")]);

    Json(body)
}

/// Handle `GET /work`
///
/// Simulates `ms` milliseconds of work (default 200) by suspending the task,
/// so concurrent requests keep being served. A negative `ms` is echoed back
/// unchanged but clamps the sleep to zero.
pub async fn work(State(state): State<AppState>, Query(params): Query<WorkParams>) -> Json<Value> {
    let started = Instant::now();
    let ms = params.ms.unwrap_or(200);

    let span = tracing::info_span!("compute", endpoint = "/work", work.ms = ms);
    async {
        tokio::time::sleep(Duration::from_millis(ms.max(0) as u64)).await;
        let p: f64 = rand::thread_rng().gen();
        if p < 0.05 {
            tracing::warn!(trace_id = %current_trace_id(), "intermittent issue observed");
        }
    }
    .instrument(span)
    .await;

    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    let route = [KeyValue::new("route", "/work")];
    state.metrics.requests.add(1, &route);
    state.metrics.latency.record(elapsed_ms, &route);

    Json(json!({
        "ok": true,
        "work_ms": ms,
        "latency_ms": (elapsed_ms * 100.0).round() / 100.0,
    }))
}

/// Handle `GET /error`
///
/// Always fails, so the pipeline has an error signal to ingest.
pub async fn error(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let span = tracing::info_span!("boom", endpoint = "/error");
    async {
        state
            .metrics
            .errors
            .add(1, &[KeyValue::new("route", "/error")]);
        tracing::error!(trace_id = %current_trace_id(), "boom: user-triggered error");
        Err(AppError::Boom("user-triggered error".to_string()))
    }
    .instrument(span)
    .await
}
