use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::storage::{AccessAttempt, AllowEntry, DenyEntry};
use crate::utils::{GateError, GateResult};

/// Default admin API location
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8787";

/// Response to allow and approve calls
#[derive(Debug, Deserialize)]
pub struct EntryResponse {
    pub success: bool,
    pub entry: AllowEntry,
}

/// Response to revoke calls
#[derive(Debug, Deserialize)]
pub struct RevokeResponse {
    pub success: bool,
    pub removed: usize,
}

/// Client for the gate's admin API
pub struct AdminClient {
    client: ReqwestClient,
    token: String,
    base_url: String,
}

impl AdminClient {
    /// Creates a new admin client; a missing or empty token is an error
    pub fn new(server_url: &str, token: Option<&str>) -> GateResult<Self> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(GateError::MissingAdminToken)?;

        Ok(Self {
            client: ReqwestClient::builder()
                .timeout(Duration::from_secs(30))
                .build()?,
            token: token.to_string(),
            base_url: server_url.trim_end_matches('/').to_string(),
        })
    }

    /// Lists the most recent access attempts
    pub async fn attempts(&self) -> GateResult<Vec<AccessAttempt>> {
        self.call(Method::GET, "/api/attempts", None).await
    }

    /// Approves an attempt, optionally for `ttl_ms`
    pub async fn approve(&self, attempt_id: &str, ttl_ms: Option<i64>) -> GateResult<EntryResponse> {
        let body = json!({ "attemptId": attempt_id, "ttlMs": ttl_ms });
        self.call(Method::POST, "/api/approve", Some(body)).await
    }

    /// Allows an IP or CIDR block, optionally for `ttl_ms`
    pub async fn allow(&self, ip_or_cidr: &str, ttl_ms: Option<i64>) -> GateResult<EntryResponse> {
        let body = json!({ "ipOrCidr": ip_or_cidr, "ttlMs": ttl_ms });
        self.call(Method::POST, "/api/allow", Some(body)).await
    }

    /// Removes an allow entry by its exact key
    pub async fn revoke(&self, ip_or_cidr: &str) -> GateResult<RevokeResponse> {
        let body = json!({ "ipOrCidr": ip_or_cidr });
        self.call(Method::DELETE, "/api/revoke", Some(body)).await
    }

    /// Adds an IP or CIDR block to the deny list
    pub async fn deny(&self, ip_or_cidr: &str) -> GateResult<Value> {
        let body = json!({ "ipOrCidr": ip_or_cidr });
        self.call(Method::POST, "/api/deny", Some(body)).await
    }

    pub async fn allowlist(&self) -> GateResult<Vec<AllowEntry>> {
        self.call(Method::GET, "/api/allowlist", None).await
    }

    pub async fn denylist(&self) -> GateResult<Vec<DenyEntry>> {
        self.call(Method::GET, "/api/denylist", None).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> GateResult<T> {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut request = self
            .client
            .request(method, &url)
            .header("Authorization", format!("Bearer {}", self.token));
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GateError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
