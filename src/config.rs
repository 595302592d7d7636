use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::poll::Poller;
use crate::readiness::ReadyPolicy;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub stack: StackConfig,
    pub stores: StoresConfig,
    pub poll: PollConfig,
    pub loadgen: LoadgenConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Base OTLP endpoint without the per-signal suffix
    pub endpoint: String,
    pub service_name: String,
    pub service_namespace: String,
    pub service_version: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StackConfig {
    pub grafana_health_url: String,
    pub loki_ready_url: String,
    pub tempo_ready_url: String,
    pub prometheus_ready_url: String,
    pub app_base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoresConfig {
    pub tempo_search_url: String,
    pub prometheus_query_url: String,
    pub loki_query_range_url: String,
    /// Prometheus job label to query; derived from namespace/service when unset
    pub expected_job: Option<String>,
    pub query_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollConfig {
    /// Per-dependency budget for readiness checks
    pub ready_timeout_seconds: u64,
    /// Per-signal budget for ingestion waits
    pub wait_timeout_seconds: u64,
    pub interval_ms: u64,
    /// Interval growth per attempt; 1.0 keeps the interval fixed
    pub backoff_factor: f64,
    pub max_interval_ms: u64,
    pub request_timeout_seconds: u64,
    pub ready_policy: ReadyPolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoadgenConfig {
    pub target_base_url: String,
    pub interval_ms: u64,
    pub error_ratio: f64,
    pub work_ratio: f64,
    pub work_ms_min: u64,
    pub work_ms_max: u64,
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            endpoint: env_or("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4318"),
            service_name: env_or("OTEL_SERVICE_NAME", "otel-probe"),
            service_namespace: env_or("SERVICE_NAMESPACE", "demo"),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            grafana_health_url: env_or("GRAFANA_HEALTH_URL", "http://localhost:3000/api/health"),
            loki_ready_url: env_or("LOKI_READY_URL", "http://localhost:3100/ready"),
            tempo_ready_url: env_or("TEMPO_READY_URL", "http://localhost:3200/ready"),
            prometheus_ready_url: env_or("PROM_READY_URL", "http://localhost:9090/-/ready"),
            app_base_url: env_or("APP_BASE_URL", "http://localhost:8000"),
        }
    }
}

impl Default for StoresConfig {
    fn default() -> Self {
        Self {
            tempo_search_url: env_or("TEMPO_SEARCH_URL", "http://localhost:3200/api/search"),
            prometheus_query_url: env_or("PROM_QUERY_URL", "http://localhost:9090/api/v1/query"),
            loki_query_range_url: env_or(
                "LOKI_QUERY_RANGE_URL",
                "http://localhost:3100/loki/api/v1/query_range",
            ),
            expected_job: std::env::var("PROM_EXPECTED_JOB").ok(),
            query_timeout_seconds: 10,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            ready_timeout_seconds: env_u64("STACK_READY_TIMEOUT", 180),
            wait_timeout_seconds: env_u64("OBS_WAIT_TIMEOUT", 120),
            interval_ms: 1000,
            backoff_factor: 1.0,
            max_interval_ms: 10_000,
            request_timeout_seconds: 5,
            ready_policy: ReadyPolicy::FailFast,
        }
    }
}

impl Default for LoadgenConfig {
    fn default() -> Self {
        Self {
            target_base_url: env_or("TARGET_BASE_URL", "http://localhost:8000"),
            interval_ms: 400,
            error_ratio: 0.01,
            work_ratio: 0.19,
            work_ms_min: 100,
            work_ms_max: 500,
            request_timeout_seconds: 5,
        }
    }
}

impl Config {
    /// Prometheus job label the demo service's metrics land under
    pub fn expected_job(&self) -> String {
        self.stores.expected_job.clone().unwrap_or_else(|| {
            format!(
                "{}/{}",
                self.telemetry.service_namespace, self.telemetry.service_name
            )
        })
    }
}

impl PollConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_seconds)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Build a poller with this cadence and the given total timeout
    pub fn poller(&self, timeout: Duration) -> Poller {
        Poller::new(timeout)
            .with_interval(Duration::from_millis(self.interval_ms))
            .with_backoff(
                self.backoff_factor,
                Duration::from_millis(self.max_interval_ms),
            )
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

pub fn load_config() -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::with_name("config").required(false))
        .add_source(config::Environment::with_prefix("OTEL_PROBE").separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.telemetry.service_name.is_empty() {
        anyhow::bail!("Service name cannot be empty");
    }

    if cfg.telemetry.endpoint.is_empty() {
        anyhow::bail!("OTLP endpoint cannot be empty");
    }

    if cfg.poll.interval_ms == 0 {
        anyhow::bail!("Poll interval must be positive");
    }

    if cfg.poll.backoff_factor < 1.0 {
        anyhow::bail!(
            "Backoff factor must be at least 1.0, got {}",
            cfg.poll.backoff_factor
        );
    }

    if cfg.loadgen.interval_ms == 0 {
        anyhow::bail!("Load generator interval must be positive");
    }

    if cfg.loadgen.error_ratio < 0.0 || cfg.loadgen.work_ratio < 0.0 {
        anyhow::bail!("Load mix ratios cannot be negative");
    }

    if cfg.loadgen.error_ratio + cfg.loadgen.work_ratio > 1.0 {
        anyhow::bail!(
            "Load mix ratios sum to {}, must not exceed 1.0",
            cfg.loadgen.error_ratio + cfg.loadgen.work_ratio
        );
    }

    if cfg.loadgen.work_ms_min > cfg.loadgen.work_ms_max {
        anyhow::bail!(
            "Work duration range is inverted: {}ms > {}ms",
            cfg.loadgen.work_ms_min,
            cfg.loadgen.work_ms_max
        );
    }

    Ok(())
}
