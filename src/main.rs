use std::net::SocketAddr;
use std::sync::Arc;

use ipgate::config::Settings;
use ipgate::core::{ExpirySweeper, SystemClock};
use ipgate::http::{self, AppState};
use ipgate::storage::ListStore;
use ipgate::utils::{init_logging, GateError, GateResult};
use metrics_exporter_prometheus::PrometheusBuilder;

#[tokio::main]
async fn main() -> GateResult<()> {
    init_logging();
    tracing::info!("Starting IP gate service...");

    let settings = Settings::load()?;
    tracing::info!(
        host = %settings.server.host,
        port = %settings.server.port,
        trust_proxy = settings.server.trust_proxy,
        data_dir = %settings.storage.data_dir.display(),
        "Configuration loaded"
    );
    if settings.admin.token.is_none() {
        tracing::warn!("ADMIN_TOKEN is not set; every admin request will be rejected");
    }

    let store = Arc::new(ListStore::from_config(&settings.storage));
    let clock = Arc::new(SystemClock);

    let mut state = AppState::new(&settings, store.clone(), clock.clone())?;
    if settings.metrics.enabled {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => state = state.with_metrics(handle),
            Err(e) => tracing::warn!(error = %e, "metrics recorder not installed"),
        }
    }
    let state = Arc::new(state);

    let sweeper = Arc::new(ExpirySweeper::new(store, clock)).spawn(settings.sweeper.interval())?;
    let limiter_cleanup = state
        .rate_limiter
        .clone()
        .spawn_cleanup(settings.rate_limit.window())?;

    let addr: SocketAddr = settings
        .bind_address()
        .parse()
        .map_err(|e| GateError::Internal(format!("invalid bind address: {}", e)))?;
    tracing::info!(%addr, "Server running; admin endpoints require ADMIN_TOKEN authentication");

    axum::Server::bind(&addr)
        .serve(http::router(state).into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GateError::Internal(e.to_string()))?;

    sweeper.abort();
    limiter_cleanup.abort();
    tracing::info!("IP gate service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
