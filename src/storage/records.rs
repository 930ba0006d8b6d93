use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three persisted lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListName {
    Attempts,
    Allow,
    Deny,
}

impl ListName {
    /// File name of the list inside the data directory
    pub fn file_name(self) -> &'static str {
        match self {
            ListName::Attempts => "attempts.json",
            ListName::Allow => "allow.json",
            ListName::Deny => "deny.json",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            ListName::Attempts => 0,
            ListName::Allow => 1,
            ListName::Deny => 2,
        }
    }
}

/// A visitor that was neither allowed nor denied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessAttempt {
    pub id: String,
    pub ip: String,
    pub user_agent: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

impl AccessAttempt {
    /// Create a new attempt with a fresh id and the current time
    pub fn new(ip: &str, user_agent: &str) -> Self {
        Self {
            id: new_attempt_id(),
            ip: ip.to_string(),
            user_agent: user_agent.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Line appended to the plain-text audit log
    pub fn audit_line(&self) -> String {
        format!(
            "{} - {} - {} - {}",
            self.timestamp, self.ip, self.user_agent, self.id
        )
    }
}

/// An IP or CIDR block that may pass the gate, optionally until `expires_at`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowEntry {
    pub ip_or_cidr: String,
    /// Epoch milliseconds
    pub added_at: i64,
    /// Epoch milliseconds; `None` means permanent
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_from: Option<String>,
}

impl AllowEntry {
    /// Build an entry added at `now`, expiring `ttl_ms` later when given
    pub fn new(ip_or_cidr: &str, now: i64, ttl_ms: Option<i64>) -> Self {
        Self {
            ip_or_cidr: ip_or_cidr.to_string(),
            added_at: now,
            expires_at: ttl_ms
                .filter(|ttl| *ttl > 0)
                .map(|ttl| now.saturating_add(ttl)),
            approved_from: None,
        }
    }

    /// Whether the entry is still in force at `now`
    pub fn is_active(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at > now,
            None => true,
        }
    }
}

/// An IP or CIDR block that is always refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DenyEntry {
    pub ip_or_cidr: String,
    /// Epoch milliseconds
    pub added_at: i64,
}

fn new_attempt_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(12);
    id
}
