//! Telemetry initialization: traces, metrics, and logs exported over OTLP.
//!
//! One call builds all three signal pipelines from a single base endpoint,
//! attaches the shared resource identity, and installs the tracing
//! subscriber registry (console formatting, log bridge, span layer).

use anyhow::Result;
use opentelemetry::trace::TraceContextExt;
use opentelemetry::{global, KeyValue};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{
    LogExporter, MetricExporter, Protocol, SpanExporter, WithExportConfig,
};
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use tracing_opentelemetry::{OpenTelemetryLayer, OpenTelemetrySpanExt};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry,
};

use crate::config::TelemetryConfig;

/// Handle for explicit shutdown of the telemetry providers
///
/// Shutdown flushes the batch exporters; dropping the handle without calling
/// it may lose the final batches.
pub struct TelemetryHandle {
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
    logger_provider: SdkLoggerProvider,
}

impl TelemetryHandle {
    /// Flush and shut down all three providers, aggregating any errors
    pub fn shutdown(self) -> Result<()> {
        let mut errs = Vec::new();
        if let Err(e) = self.tracer_provider.shutdown() {
            errs.push(format!("tracer: {e}"));
        }
        if let Err(e) = self.meter_provider.shutdown() {
            errs.push(format!("meter: {e}"));
        }
        if let Err(e) = self.logger_provider.shutdown() {
            errs.push(format!("logger: {e}"));
        }
        if errs.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(errs.join(", "))
        }
    }
}

/// Initialize the OTLP pipelines and install the tracing subscriber
///
/// This function:
/// 1. Builds the shared resource (service name, version, namespace)
/// 2. Builds span, metric, and log exporters off the base endpoint
/// 3. Installs global tracer and meter providers
/// 4. Initializes the subscriber registry: env filter, console formatting,
///    the tracing-to-log bridge, and the OpenTelemetry span layer
///
/// Can only be called once per process; the registry install panics on a
/// second call, same as any other global subscriber setup.
pub fn init_telemetry(cfg: &TelemetryConfig) -> Result<TelemetryHandle> {
    let resource = Resource::builder()
        .with_service_name(cfg.service_name.clone())
        .with_attributes([
            KeyValue::new("service.version", cfg.service_version.clone()),
            KeyValue::new("service.namespace", cfg.service_namespace.clone()),
        ])
        .build();

    let base = cfg.endpoint.trim_end_matches('/');
    let span_exporter = SpanExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(format!("{}/v1/traces", base))
        .build()?;
    let metric_exporter = MetricExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(format!("{}/v1/metrics", base))
        .build()?;
    let log_exporter = LogExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(format!("{}/v1/logs", base))
        .build()?;

    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(span_exporter)
        .with_resource(resource.clone())
        .build();
    global::set_tracer_provider(tracer_provider.clone());

    let metric_reader = PeriodicReader::builder(metric_exporter).build();
    let meter_provider = SdkMeterProvider::builder()
        .with_reader(metric_reader)
        .with_resource(resource.clone())
        .build();
    global::set_meter_provider(meter_provider.clone());

    let logger_provider = SdkLoggerProvider::builder()
        .with_batch_exporter(log_exporter)
        .with_resource(resource)
        .build();
    let bridge_layer = OpenTelemetryTracingBridge::new(&logger_provider);

    let otel_trace_layer = OpenTelemetryLayer::new(global::tracer("otel-probe"));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(bridge_layer)
        .with(otel_trace_layer)
        .init();

    Ok(TelemetryHandle {
        tracer_provider,
        meter_provider,
        logger_provider,
    })
}

/// Trace id of the current span, for log correlation fields
///
/// All zeros when no sampled span is active (e.g. outside the span layer).
pub fn current_trace_id() -> String {
    let context = tracing::Span::current().context();
    let span = context.span();
    span.span_context().trace_id().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_trace_id_without_span_is_zero() {
        // No subscriber and no active span here
        assert_eq!(current_trace_id(), "00000000000000000000000000000000");
    }
}
