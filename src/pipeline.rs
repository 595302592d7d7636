//! End-to-end checks for the observability pipeline
//!
//! Sends a known traffic sample through the demo service, then polls each
//! telemetry store until the corresponding signal has been ingested.

use anyhow::{bail, Context, Result};
use reqwest::{Client, StatusCode};
use tracing::info;

use crate::config::Config;
use crate::metrics::REQUESTS_TOTAL;
use crate::poll::Probe;
use crate::stores::{LokiClient, PrometheusClient, TempoClient};

/// Send a small, deterministic traffic sample through the demo service
///
/// This function:
/// 1. Hits `/` three times so the request counter moves past zero
/// 2. Runs one `/work` request to produce a latency sample
/// 3. Forces one `/error` and insists on a 500 coming back
pub async fn exercise_application(client: &Client, config: &Config) -> Result<()> {
    let base = config.stack.app_base_url.trim_end_matches('/').to_string();
    let timeout = config.poll.request_timeout();

    for _ in 0..3 {
        client
            .get(format!("{}/", base))
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()
            .context("hello request failed")?;
    }

    client
        .get(format!("{}/work", base))
        .query(&[("ms", 150)])
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()
        .context("work request failed")?;

    let error = client
        .get(format!("{}/error", base))
        .timeout(timeout)
        .send()
        .await?;
    if error.status() != StatusCode::INTERNAL_SERVER_ERROR {
        bail!("error route returned {} instead of 500", error.status());
    }

    info!("Demo traffic sent to {}", base);
    Ok(())
}

/// Wait until every store has ingested the sample traffic
///
/// Signals are checked in ingestion order and each one gets the full wait
/// timeout to itself.
pub async fn wait_for_ingestion(client: &Client, config: &Config) -> Result<()> {
    let poller = config.poll.poller(config.poll.wait_timeout());
    let service = &config.telemetry.service_name;

    let tempo = TempoClient::new(client.clone(), config);
    info!("Waiting for traces in Tempo...");
    poller
        .wait_until(
            || {
                let tempo = tempo.clone();
                async move { Probe::from(tempo.has_recent_traces().await) }
            },
            &format!("Tempo never returned a trace for service.name={}", service),
        )
        .await?;
    info!("Traces ingested");

    let prometheus = PrometheusClient::new(client.clone(), config);
    info!("Waiting for metrics in Prometheus...");
    poller
        .wait_until(
            || {
                let prometheus = prometheus.clone();
                async move { Probe::from(prometheus.has_samples(REQUESTS_TOTAL).await) }
            },
            &format!("Prometheus never returned {} metrics", REQUESTS_TOTAL),
        )
        .await?;
    info!("Metrics ingested");

    let loki = LokiClient::new(client.clone(), config);
    info!("Waiting for logs in Loki...");
    poller
        .wait_until(
            || {
                let loki = loki.clone();
                async move { Probe::from(loki.has_recent_logs().await) }
            },
            &format!("Loki never returned logs for service_name={}", service),
        )
        .await?;
    info!("Logs ingested");

    Ok(())
}
