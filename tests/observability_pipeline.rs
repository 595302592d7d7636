//! End-to-end tests for the probe against mocked stack backends
//!
//! Everything the verify flow talks to over HTTP is stood in for by a mock
//! server, so readiness sequencing, traffic exercise and ingestion polling
//! can be tested without a running stack.

use httpmock::prelude::*;
use otel_probe::config::Config;
use otel_probe::handlers::AppState;
use otel_probe::metrics::AppMetrics;
use otel_probe::pipeline;
use otel_probe::readiness::{self, ReadyPolicy};
use otel_probe::server;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn stack_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.stack.grafana_health_url = server.url("/api/health");
    config.stack.loki_ready_url = server.url("/loki/ready");
    config.stack.tempo_ready_url = server.url("/tempo/ready");
    config.stack.prometheus_ready_url = server.url("/-/ready");
    config.stack.app_base_url = server.url("");
    config.stores.tempo_search_url = server.url("/api/search");
    config.stores.prometheus_query_url = server.url("/api/v1/query");
    config.stores.loki_query_range_url = server.url("/loki/api/v1/query_range");
    config.poll.ready_timeout_seconds = 1;
    config.poll.wait_timeout_seconds = 1;
    config.poll.interval_ms = 25;
    config
}

async fn mock_healthy_grafana(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/health");
            then.status(200)
                .json_body(json!({"database": "ok", "version": "10.4.0"}));
        })
        .await;
}

async fn mock_ready_stack(server: &MockServer) {
    mock_healthy_grafana(server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/loki/ready");
            then.status(200).body("ready");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/tempo/ready");
            then.status(204);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/-/ready");
            then.status(200);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).json_body(json!({"ok": true}));
        })
        .await;
}

fn tempo_search_hit() -> serde_json::Value {
    json!({"traces": [{"traceID": "2f3e0cee77ae5dc9c17ade3689eb2e54"}]})
}

fn prometheus_vector(value: &str) -> serde_json::Value {
    json!({
        "status": "success",
        "data": {
            "resultType": "vector",
            "result": [
                {"metric": {"exported_job": "demo/otel-probe"}, "value": [1724238000.0, value]}
            ]
        }
    })
}

fn loki_streams() -> serde_json::Value {
    json!({
        "status": "success",
        "data": {
            "resultType": "streams",
            "result": [
                {"stream": {"service_name": "otel-probe"}, "values": [["1724238000000000000", "hello"]]}
            ]
        }
    })
}

#[tokio::test]
async fn test_stack_readiness_passes_when_every_dependency_answers() {
    let mock_stack = MockServer::start_async().await;
    mock_ready_stack(&mock_stack).await;

    let config = stack_config(&mock_stack);
    readiness::wait_for_stack_ready(&Client::new(), &config)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_fail_fast_stops_before_later_checks() {
    let mock_stack = MockServer::start_async().await;
    mock_healthy_grafana(&mock_stack).await;
    mock_stack
        .mock_async(|when, then| {
            when.method(GET).path("/loki/ready");
            then.status(503);
        })
        .await;
    let tempo = mock_stack
        .mock_async(|when, then| {
            when.method(GET).path("/tempo/ready");
            then.status(200);
        })
        .await;

    let config = stack_config(&mock_stack);
    let err = readiness::wait_for_stack_ready(&Client::new(), &config)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Loki failed to become ready"));
    assert_eq!(tempo.hits_async().await, 0);
}

#[tokio::test]
async fn test_check_all_aggregates_failures() {
    let mock_stack = MockServer::start_async().await;
    mock_healthy_grafana(&mock_stack).await;
    mock_stack
        .mock_async(|when, then| {
            when.method(GET).path("/loki/ready");
            then.status(503);
        })
        .await;
    mock_stack
        .mock_async(|when, then| {
            when.method(GET).path("/tempo/ready");
            then.status(503);
        })
        .await;
    mock_stack
        .mock_async(|when, then| {
            when.method(GET).path("/-/ready");
            then.status(200);
        })
        .await;
    let app = mock_stack
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200);
        })
        .await;

    let mut config = stack_config(&mock_stack);
    config.poll.ready_policy = ReadyPolicy::CheckAll;

    let err = readiness::wait_for_stack_ready(&Client::new(), &config)
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("Loki failed to become ready"));
    assert!(message.contains("Tempo failed to become ready"));
    assert!(app.hits_async().await >= 1);
}

#[tokio::test]
async fn test_readiness_reports_connection_errors() {
    let mut config = Config::default();
    config.stack.grafana_health_url = "http://127.0.0.1:1/api/health".to_string();
    config.poll.ready_timeout_seconds = 1;
    config.poll.interval_ms = 100;
    config.poll.request_timeout_seconds = 1;

    let err = readiness::wait_for_stack_ready(&Client::new(), &config)
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("Grafana failed to become ready"));
    assert!(message.contains("last error"));
}

#[tokio::test]
async fn test_exercise_application_drives_the_demo_service() {
    let state = AppState {
        config: Arc::new(Config::default()),
        metrics: AppMetrics::new(),
    };
    let app = server::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut config = Config::default();
    config.stack.app_base_url = format!("http://{}", addr);

    pipeline::exercise_application(&Client::new(), &config)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_ingestion_wait_sees_all_signals() {
    let mock_stack = MockServer::start_async().await;
    let tempo = mock_stack
        .mock_async(|when, then| {
            when.method(POST).path("/api/search");
            then.status(200).json_body(tempo_search_hit());
        })
        .await;
    let prometheus = mock_stack
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/query");
            then.status(200).json_body(prometheus_vector("5"));
        })
        .await;
    let loki = mock_stack
        .mock_async(|when, then| {
            when.method(GET).path("/loki/api/v1/query_range");
            then.status(200).json_body(loki_streams());
        })
        .await;

    let config = stack_config(&mock_stack);
    pipeline::wait_for_ingestion(&Client::new(), &config)
        .await
        .unwrap();

    assert_eq!(tempo.hits_async().await, 1);
    assert_eq!(prometheus.hits_async().await, 1);
    assert_eq!(loki.hits_async().await, 1);
}

#[tokio::test]
async fn test_ingestion_wait_recovers_when_traces_arrive_late() {
    let mock_stack = MockServer::start_async().await;
    let mut empty_tempo = mock_stack
        .mock_async(|when, then| {
            when.method(POST).path("/api/search");
            then.status(200).json_body(json!({"traces": []}));
        })
        .await;
    mock_stack
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/query");
            then.status(200).json_body(prometheus_vector("5"));
        })
        .await;
    mock_stack
        .mock_async(|when, then| {
            when.method(GET).path("/loki/api/v1/query_range");
            then.status(200).json_body(loki_streams());
        })
        .await;

    let mut config = stack_config(&mock_stack);
    config.poll.wait_timeout_seconds = 5;

    let client = Client::new();
    let wait = pipeline::wait_for_ingestion(&client, &config);
    let backfill = async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        empty_tempo.delete_async().await;
        mock_stack
            .mock_async(|when, then| {
                when.method(POST).path("/api/search");
                then.status(200).json_body(tempo_search_hit());
            })
            .await
    };

    let (result, _tempo) = tokio::join!(wait, backfill);
    result.unwrap();
}

#[tokio::test]
async fn test_ingestion_wait_names_the_silent_store() {
    let mock_stack = MockServer::start_async().await;
    mock_stack
        .mock_async(|when, then| {
            when.method(POST).path("/api/search");
            then.status(200).json_body(json!({"traces": []}));
        })
        .await;

    let config = stack_config(&mock_stack);
    let err = pipeline::wait_for_ingestion(&Client::new(), &config)
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        format!(
            "Tempo never returned a trace for service.name={}",
            config.telemetry.service_name
        )
    );
}
