use anyhow::Result;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{config::Config, handlers, handlers::AppState, metrics::AppMetrics, telemetry};

/// Start the instrumented demo service
///
/// This function:
/// 1. Initializes the OTLP providers for traces, metrics and logs
/// 2. Creates the Axum application
/// 3. Binds to the configured address
/// 4. Serves requests with graceful shutdown support
/// 5. Flushes buffered telemetry on exit
pub async fn start_server(config: Config) -> Result<()> {
    let handle = telemetry::init_telemetry(&config.telemetry)?;

    // Instruments resolve against the global meter provider, so create them
    // only after init_telemetry has installed it.
    let state = AppState {
        config: Arc::new(config.clone()),
        metrics: AppMetrics::new(),
    };

    let app = create_router(state);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    info!("Starting {} on {}", config.telemetry.service_name, addr);
    info!(
        "Exporting traces, metrics and logs to {}",
        config.telemetry.endpoint
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Flushing telemetry...");
    handle.shutdown()?;
    info!("Server stopped gracefully");

    Ok(())
}

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::demo::root))
        .route("/work", get(handlers::demo::work))
        .route("/error", get(handlers::demo::error))
        .route("/health", get(handlers::health::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolve on SIGINT or SIGTERM, so `docker stop` drains connections and
/// flushes telemetry the same way Ctrl-C does.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to setup SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, draining connections..."),
        _ = terminate => info!("SIGTERM received, draining connections..."),
    }
}
