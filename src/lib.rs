pub mod config;
pub mod error;
pub mod handlers;
pub mod loadgen;
pub mod metrics;
pub mod pipeline;
pub mod poll;
pub mod readiness;
pub mod server;
pub mod stores;
pub mod telemetry;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing/logging
///
/// Note: This function can only be called once. The serve command skips it
/// and installs a subscriber wired into the OTLP pipeline instead.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
