use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

use super::result_entries;
use crate::config::Config;

/// Runs instant queries against Prometheus
#[derive(Clone)]
pub struct PrometheusClient {
    client: Client,
    query_url: String,
    expected_job: String,
    timeout: Duration,
}

impl PrometheusClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            query_url: config.stores.prometheus_query_url.clone(),
            expected_job: config.expected_job(),
            timeout: Duration::from_secs(config.stores.query_timeout_seconds),
        }
    }

    /// Whether any series of `metric` for the expected job has a sample >= 1
    ///
    /// The collector relabels the service job into `exported_job`, so that is
    /// the label the query filters on.
    pub async fn has_samples(&self, metric: &str) -> Result<bool> {
        let query = format!("{}{{exported_job=\"{}\"}}", metric, self.expected_job);

        let response = self
            .client
            .get(&self.query_url)
            .query(&[("query", query.as_str())])
            .timeout(self.timeout)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Ok(false);
        }

        let body: Value = response.json().await?;
        Ok(query_has_samples(&body))
    }
}

fn query_has_samples(payload: &Value) -> bool {
    match result_entries(payload) {
        Some(results) => results
            .iter()
            .any(|sample| sample_value(sample).map(|v| v >= 1.0).unwrap_or(false)),
        None => false,
    }
}

// An instant-query sample is `[<unix ts>, "<value>"]`. Samples that do not
// fit the shape are skipped rather than failing the whole check.
fn sample_value(sample: &Value) -> Option<f64> {
    match sample.get("value")?.get(1)? {
        Value::String(text) => text.parse().ok(),
        other => other.as_f64(),
    }
}
