//! HTTP surface of the IP gate service.
//! The public gate page, the bearer-token admin API, health and metrics.

mod admin;
mod client_ip;
mod gate;
mod health;
mod middleware;

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::routing::{delete, get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::core::{Clock, RateLimiter};
use crate::service::GateService;
use crate::storage::ListStore;
use crate::utils::GateResult;

pub use client_ip::ClientIp;

/// State shared by every handler
pub struct AppState {
    /// Gate and admin operations
    pub service: GateService,
    /// Per-IP ceiling on gate and admin requests
    pub rate_limiter: Arc<RateLimiter>,
    /// Expected bearer token; `None` rejects every admin call
    pub admin_token: Option<String>,
    /// Honor `X-Forwarded-For`
    pub trust_proxy: bool,
    /// Prometheus handle when the recorder is installed
    pub metrics: Option<PrometheusHandle>,
    request_timeout: std::time::Duration,
}

impl AppState {
    pub fn new(settings: &Settings, store: Arc<ListStore>, clock: Arc<dyn Clock>) -> GateResult<Self> {
        Ok(Self {
            rate_limiter: Arc::new(RateLimiter::with_clock(
                settings.rate_limit.clone(),
                clock.clone(),
            )?),
            service: GateService::new(store, clock),
            admin_token: settings.admin.token.clone(),
            trust_proxy: settings.server.trust_proxy,
            metrics: None,
            request_timeout: settings.server.request_timeout(),
        })
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Builds the full router with tracing, timeout, CORS and security headers
pub fn router(state: Arc<AppState>) -> Router {
    let admin_routes = Router::new()
        .route("/api/attempts", get(admin::list_attempts))
        .route("/api/allow", post(admin::allow))
        .route("/api/approve", post(admin::approve))
        .route("/api/revoke", delete(admin::revoke))
        .route("/api/deny", post(admin::deny))
        .route("/api/allowlist", get(admin::list_allowed))
        .route("/api/denylist", get(admin::list_denied))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_admin,
        ));

    let limited_routes = Router::new()
        .route("/gate", get(gate::gate))
        .route("/admin-service", get(gate::gate))
        .merge(admin_routes)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit,
        ));

    Router::new()
        .merge(limited_routes)
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(state.request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
