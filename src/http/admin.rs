use std::sync::Arc;

use async_trait::async_trait;
use axum::body::HttpBody;
use axum::extract::{FromRequest, State};
use axum::http::Request;
use axum::{BoxError, Json};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::AppState;
use crate::error::ApiError;
use crate::storage::{AccessAttempt, AllowEntry, DenyEntry};

/// `Json` whose rejections come back as the API's `{error}` body with a 400
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, B, T> FromRequest<S, B> for JsonBody<T>
where
    T: DeserializeOwned,
    B: HttpBody + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowRequest {
    pub ip_or_cidr: String,
    #[serde(default)]
    pub ttl_ms: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub attempt_id: String,
    #[serde(default)]
    pub ttl_ms: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecRequest {
    pub ip_or_cidr: String,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub success: bool,
    pub entry: AllowEntry,
}

pub async fn list_attempts(State(state): State<Arc<AppState>>) -> Json<Vec<AccessAttempt>> {
    Json(state.service.list_attempts().await)
}

pub async fn allow(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<AllowRequest>,
) -> Result<Json<EntryResponse>, ApiError> {
    let entry = state.service.allow(&body.ip_or_cidr, body.ttl_ms).await?;
    Ok(Json(EntryResponse { success: true, entry }))
}

pub async fn approve(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<ApproveRequest>,
) -> Result<Json<EntryResponse>, ApiError> {
    let entry = state.service.approve(&body.attempt_id, body.ttl_ms).await?;
    Ok(Json(EntryResponse { success: true, entry }))
}

pub async fn revoke(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<SpecRequest>,
) -> Result<Json<Value>, ApiError> {
    let removed = state.service.revoke(&body.ip_or_cidr).await?;
    Ok(Json(json!({ "success": true, "removed": removed })))
}

pub async fn deny(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<SpecRequest>,
) -> Result<Json<Value>, ApiError> {
    state.service.deny(&body.ip_or_cidr).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn list_allowed(State(state): State<Arc<AppState>>) -> Json<Vec<AllowEntry>> {
    Json(state.service.list_allowed().await)
}

pub async fn list_denied(State(state): State<Arc<AppState>>) -> Json<Vec<DenyEntry>> {
    Json(state.service.list_denied().await)
}
