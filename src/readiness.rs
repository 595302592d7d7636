//! Readiness sequencing for the observability stack
//!
//! Before the pipeline can be verified, every backend has to answer its
//! readiness endpoint. Checks run in dependency order and each entry gets
//! the full ready timeout to itself.

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::info;

use crate::config::{Config, StackConfig};
use crate::poll::Probe;

/// How the sequencer reacts when a dependency never comes up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReadyPolicy {
    /// Stop at the first dependency that misses its deadline
    #[default]
    FailFast,
    /// Probe every dependency and report all failures together
    CheckAll,
}

/// Decides whether a response means "ready"
pub type Validator = fn(StatusCode, &str) -> bool;

/// One entry in the readiness sequence
pub struct ReadyCheck {
    pub name: &'static str,
    pub url: String,
    pub validator: Validator,
}

/// The stock check list, in the order the stack comes up
pub fn stack_checks(stack: &StackConfig) -> Vec<ReadyCheck> {
    vec![
        ReadyCheck {
            name: "Grafana",
            url: stack.grafana_health_url.clone(),
            validator: grafana_ready,
        },
        ReadyCheck {
            name: "Loki",
            url: stack.loki_ready_url.clone(),
            validator: ready_status,
        },
        ReadyCheck {
            name: "Tempo",
            url: stack.tempo_ready_url.clone(),
            validator: ready_status,
        },
        ReadyCheck {
            name: "Prometheus",
            url: stack.prometheus_ready_url.clone(),
            validator: ok_status,
        },
        ReadyCheck {
            name: "App",
            url: format!("{}/", stack.app_base_url.trim_end_matches('/')),
            validator: ok_status,
        },
    ]
}

/// Wait until every stack dependency reports ready
///
/// This function:
/// 1. Builds the check list from the stack configuration
/// 2. Polls each endpoint until it validates or the ready timeout passes
/// 3. Applies the configured policy to checks that never validated
pub async fn wait_for_stack_ready(client: &Client, config: &Config) -> Result<()> {
    let poller = config.poll.poller(config.poll.ready_timeout());
    let request_timeout = config.poll.request_timeout();
    let mut failures = Vec::new();

    for check in stack_checks(&config.stack) {
        info!("Waiting for {} at {}", check.name, check.url);
        let what = format!("{} failed to become ready at {}", check.name, check.url);

        let result = poller
            .wait_until(
                || {
                    let client = client.clone();
                    let url = check.url.clone();
                    let validator = check.validator;
                    async move {
                        Probe::from(check_http(&client, &url, request_timeout, validator).await)
                    }
                },
                &what,
            )
            .await;

        match result {
            Ok(()) => info!("{} is ready", check.name),
            Err(err) => match config.poll.ready_policy {
                ReadyPolicy::FailFast => return Err(err.into()),
                ReadyPolicy::CheckAll => {
                    tracing::warn!(check = check.name, "dependency never became ready");
                    failures.push(err.to_string());
                }
            },
        }
    }

    if !failures.is_empty() {
        anyhow::bail!(failures.join("; "));
    }

    Ok(())
}

async fn check_http(
    client: &Client,
    url: &str,
    timeout: Duration,
    validator: Validator,
) -> Result<bool> {
    let response = client.get(url).timeout(timeout).send().await?;
    let status = response.status();
    let body = response.text().await?;
    Ok(validator(status, &body))
}

fn ok_status(status: StatusCode, _body: &str) -> bool {
    status == StatusCode::OK
}

fn ready_status(status: StatusCode, _body: &str) -> bool {
    status == StatusCode::OK || status == StatusCode::NO_CONTENT
}

/// Grafana reports overall health plus its database state; only a healthy
/// database counts as ready.
fn grafana_ready(status: StatusCode, body: &str) -> bool {
    if status != StatusCode::OK {
        return false;
    }
    serde_json::from_str::<Value>(body)
        .map(|health| health["database"] == "ok")
        .unwrap_or(false)
}
