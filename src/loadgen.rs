//! Steady background traffic for the demo service
//!
//! Keeps the pipeline supplied with a predictable mix of requests: mostly
//! plain hits on `/`, some simulated work, the occasional forced error.

use anyhow::Result;
use rand::Rng;
use reqwest::Client;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::LoadgenConfig;

/// The three request shapes the generator produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Normal,
    Work(u64),
    Error,
}

/// Map a uniform draw to a request kind using the configured ratios
///
/// The work duration is drawn only when the mix lands on a work request, so
/// ticks producing the other kinds consume exactly one random value.
fn draw_request<R: Rng>(rng: &mut R, config: &LoadgenConfig) -> RequestKind {
    let p: f64 = rng.gen();
    if p < config.error_ratio {
        RequestKind::Error
    } else if p < config.error_ratio + config.work_ratio {
        RequestKind::Work(rng.gen_range(config.work_ms_min..=config.work_ms_max))
    } else {
        RequestKind::Normal
    }
}

/// Run the load generator until `count` requests are sent, or forever
///
/// This function:
/// 1. Ticks at the configured interval, absorbing missed ticks
/// 2. Draws a request kind per tick and fires it at the target
/// 3. Logs failed requests and keeps going
/// 4. Stops cleanly on Ctrl-C
pub async fn run(config: &LoadgenConfig, count: Option<u64>) -> Result<()> {
    let client = Client::new();
    let base = config.target_base_url.trim_end_matches('/').to_string();
    let timeout = Duration::from_secs(config.request_timeout_seconds);

    let mut interval = tokio::time::interval(Duration::from_millis(config.interval_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        "Sending traffic to {} every {}ms",
        base, config.interval_ms
    );

    let mut sent: u64 = 0;
    loop {
        if let Some(limit) = count {
            if sent >= limit {
                break;
            }
        }

        tokio::select! {
            _ = &mut shutdown => {
                info!("Load generator interrupted");
                break;
            }
            _ = interval.tick() => {}
        }

        // Scope the rng so the future stays Send.
        let kind = {
            let mut rng = rand::thread_rng();
            draw_request(&mut rng, config)
        };

        if let Err(err) = send_request(&client, &base, timeout, kind).await {
            tracing::warn!(error = %err, "request failed");
        }
        sent += 1;
    }

    info!("Load generator sent {} requests", sent);
    Ok(())
}

async fn send_request(
    client: &Client,
    base: &str,
    timeout: Duration,
    kind: RequestKind,
) -> Result<()> {
    match kind {
        RequestKind::Error => {
            client
                .get(format!("{}/error", base))
                .timeout(timeout)
                .send()
                .await?;
            debug!("error request");
        }
        RequestKind::Work(work_ms) => {
            client
                .get(format!("{}/work", base))
                .query(&[("ms", work_ms)])
                .timeout(timeout)
                .send()
                .await?;
            debug!(work_ms, "work request");
        }
        RequestKind::Normal => {
            client
                .get(format!("{}/", base))
                .timeout(timeout)
                .send()
                .await?;
            debug!("normal request");
        }
    }
    Ok(())
}
