use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

use super::{query_window, result_entries};
use crate::config::Config;

/// Runs range queries against Loki
#[derive(Clone)]
pub struct LokiClient {
    client: Client,
    query_range_url: String,
    query: String,
    timeout: Duration,
}

impl LokiClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            query_range_url: config.stores.loki_query_range_url.clone(),
            query: format!("{{service_name=\"{}\"}}", config.telemetry.service_name),
            timeout: Duration::from_secs(config.stores.query_timeout_seconds),
        }
    }

    /// Whether Loki holds log streams for our service inside the lookback window
    ///
    /// Loki takes range bounds as nanosecond epoch strings.
    pub async fn has_recent_logs(&self) -> Result<bool> {
        let (start, end) = query_window();
        let start_ns = start.timestamp_nanos_opt().unwrap_or_default().to_string();
        let end_ns = end.timestamp_nanos_opt().unwrap_or_default().to_string();

        let response = self
            .client
            .get(&self.query_range_url)
            .query(&[
                ("query", self.query.as_str()),
                ("start", start_ns.as_str()),
                ("end", end_ns.as_str()),
                ("limit", "20"),
            ])
            .timeout(self.timeout)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Ok(false);
        }

        let body: Value = response.json().await?;
        Ok(range_has_streams(&body))
    }
}

fn range_has_streams(payload: &Value) -> bool {
    result_entries(payload)
        .map(|streams| !streams.is_empty())
        .unwrap_or(false)
}
