use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};

/// Counter of handled requests, queried back out of Prometheus by name
pub const REQUESTS_TOTAL: &str = "app_requests_total";
/// Counter of deliberately failed requests
pub const REQUEST_ERRORS_TOTAL: &str = "app_request_errors_total";
/// Histogram of request durations in milliseconds
pub const REQUEST_DURATION_MS: &str = "app_request_duration_ms";

/// Instruments shared by the demo handlers
///
/// Registered against the global meter provider, so they export over OTLP
/// once the meter provider is installed and fall back to no-ops in tests.
#[derive(Clone)]
pub struct AppMetrics {
    pub requests: Counter<u64>,
    pub errors: Counter<u64>,
    pub latency: Histogram<f64>,
}

impl AppMetrics {
    pub fn new() -> Self {
        let meter = global::meter("otel-probe");

        Self {
            requests: meter
                .u64_counter(REQUESTS_TOTAL)
                .with_description("Total requests")
                .build(),
            errors: meter
                .u64_counter(REQUEST_ERRORS_TOTAL)
                .with_description("Total errors")
                .build(),
            latency: meter
                .f64_histogram(REQUEST_DURATION_MS)
                .with_unit("ms")
                .with_description("Request duration")
                .build(),
        }
    }
}

impl Default for AppMetrics {
    fn default() -> Self {
        Self::new()
    }
}
