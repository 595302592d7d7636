use anyhow::Result;
use chrono::SecondsFormat;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

use super::query_window;
use crate::config::Config;

/// Searches Tempo for recently ingested traces
#[derive(Clone)]
pub struct TempoClient {
    client: Client,
    search_url: String,
    query: String,
    timeout: Duration,
}

impl TempoClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            search_url: config.stores.tempo_search_url.clone(),
            query: format!(
                "{{ service.name = \"{}\" }}",
                config.telemetry.service_name
            ),
            timeout: Duration::from_secs(config.stores.query_timeout_seconds),
        }
    }

    /// Whether Tempo holds a trace for our service inside the lookback window
    ///
    /// A non-200 answer means "not ingested yet". A 200 with a body that is
    /// not valid JSON is an error, so the caller can report it.
    pub async fn has_recent_traces(&self) -> Result<bool> {
        let (start, end) = query_window();
        let payload = json!({
            "query": self.query,
            "start": start.to_rfc3339_opts(SecondsFormat::Millis, false),
            "end": end.to_rfc3339_opts(SecondsFormat::Millis, false),
            "limit": 5,
        });

        let response = self
            .client
            .post(&self.search_url)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Ok(false);
        }

        let body: Value = response.json().await?;
        Ok(search_has_traces(&body))
    }
}

// Tempo returns matches at the top level or nested under `data`, depending
// on version.
fn search_has_traces(payload: &Value) -> bool {
    has_items(&payload["traces"]) || has_items(&payload["data"]["traces"])
}

fn has_items(value: &Value) -> bool {
    value.as_array().map(|items| !items.is_empty()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_finds_top_level_traces() {
        let payload = json!({"traces": [{"traceID": "abc123"}]});
        assert!(search_has_traces(&payload));
    }

    #[test]
    fn test_search_finds_nested_traces() {
        let payload = json!({"data": {"traces": [{"traceID": "abc123"}]}});
        assert!(search_has_traces(&payload));
    }

    #[test]
    fn test_search_skips_empty_top_level_list() {
        let payload = json!({"traces": [], "data": {"traces": [{"traceID": "abc123"}]}});
        assert!(search_has_traces(&payload));
    }

    #[test]
    fn test_search_rejects_empty_results() {
        assert!(!search_has_traces(&json!({"traces": []})));
        assert!(!search_has_traces(&json!({"data": {"traces": []}})));
        assert!(!search_has_traces(&json!({})));
        assert!(!search_has_traces(&json!({"traces": null})));
    }

    #[test]
    fn test_query_names_the_service() {
        let config = Config::default();
        let client = TempoClient::new(Client::new(), &config);
        assert_eq!(
            client.query,
            format!("{{ service.name = \"{}\" }}", config.telemetry.service_name)
        );
    }
}
