use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::{AppState, ClientIp};
use crate::error::ApiError;
use crate::utils::{log_admin_event, GateError};

/// Rejects admin requests whose bearer token does not equal the configured one
pub async fn require_admin<B>(
    State(state): State<Arc<AppState>>,
    request: Request<B>,
    next: Next<B>,
) -> Response {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match (state.admin_token.as_deref(), presented) {
        (Some(expected), Some(token)) if token == expected => next.run(request).await,
        (None, _) => {
            log_admin_event("auth", false, Some("admin token is not configured"));
            ApiError::from(GateError::MissingAdminToken).into_response()
        }
        _ => {
            log_admin_event(
                "auth",
                false,
                Some(&format!("rejected token for {}", request.uri().path())),
            );
            ApiError::from(GateError::Unauthorized).into_response()
        }
    }
}

/// Applies the per-IP request ceiling
pub async fn rate_limit<B>(
    State(state): State<Arc<AppState>>,
    client_ip: ClientIp,
    request: Request<B>,
    next: Next<B>,
) -> Response {
    match state.rate_limiter.check_rate_limit(&client_ip.0) {
        Ok(()) => next.run(request).await,
        Err(e) => ApiError::from(e).into_response(),
    }
}
