use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::utils::GateError;

/// Errors returned to admin API callers
#[derive(Debug)]
pub enum ApiError {
    /// Bearer token missing, wrong, or not configured
    Unauthorized,
    /// Referenced attempt does not exist
    NotFound(String),
    /// Request body failed validation
    BadRequest(String),
    /// Request rate limit has been exceeded
    RateLimitExceeded,
    /// Internal service error; the message is logged, never returned
    InternalError(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the caller
    fn public_message(&self) -> String {
        match self {
            ApiError::Unauthorized => "Invalid admin token".to_string(),
            ApiError::NotFound(_) => "Attempt not found".to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::RateLimitExceeded => {
                "Too many requests, please try again later.".to_string()
            }
            ApiError::InternalError(_) => "Internal server error".to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized => write!(f, "Unauthorized"),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Converts a gate error into an API error
impl From<GateError> for ApiError {
    fn from(error: GateError) -> Self {
        match error {
            GateError::Unauthorized | GateError::MissingAdminToken => ApiError::Unauthorized,
            GateError::AttemptNotFound(id) => ApiError::NotFound(id),
            GateError::InvalidInput(msg) | GateError::InvalidTtl(msg) => ApiError::BadRequest(msg),
            GateError::RateLimitExceeded(_) => ApiError::RateLimitExceeded,
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::InternalError(msg) = &self {
            tracing::error!(error = %msg, "admin request failed");
        }
        let body = Json(json!({ "error": self.public_message() }));
        (self.status(), body).into_response()
    }
}
