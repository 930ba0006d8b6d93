use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::core::cidr;
use crate::core::clock::Clock;
use crate::storage::{AllowEntry, DenyEntry, ListName, ListStore};

/// Outcome of checking an IP against the deny and allow lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    /// Matched a deny entry
    Denied,
    /// Matched an unexpired allow entry
    Allowed,
    /// Matched nothing; the visitor needs approval
    NotAllowed,
}

impl AccessDecision {
    pub fn allowed(self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessDecision::Denied => "denied",
            AccessDecision::Allowed => "allowed",
            AccessDecision::NotAllowed => "not_allowed",
        }
    }
}

impl fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deny first, then unexpired allow entries, first match wins
pub fn decide(ip: &str, deny: &[DenyEntry], allow: &[AllowEntry], now: i64) -> AccessDecision {
    if deny.iter().any(|entry| cidr::matches(ip, &entry.ip_or_cidr)) {
        return AccessDecision::Denied;
    }

    if allow
        .iter()
        .any(|entry| cidr::matches(ip, &entry.ip_or_cidr) && entry.is_active(now))
    {
        return AccessDecision::Allowed;
    }

    AccessDecision::NotAllowed
}

/// Evaluates IPs against the lists as currently stored on disk
pub struct AccessEvaluator {
    store: Arc<ListStore>,
    clock: Arc<dyn Clock>,
}

impl AccessEvaluator {
    pub fn new(store: Arc<ListStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Re-reads both lists and decides for `ip`
    pub async fn evaluate(&self, ip: &str) -> AccessDecision {
        let deny: Vec<DenyEntry> = self.store.load(ListName::Deny).await;
        if deny.iter().any(|entry| cidr::matches(ip, &entry.ip_or_cidr)) {
            return AccessDecision::Denied;
        }

        let allow: Vec<AllowEntry> = self.store.load(ListName::Allow).await;
        decide(ip, &[], &allow, self.clock.now_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::MockClock;

    fn deny(spec: &str) -> DenyEntry {
        DenyEntry { ip_or_cidr: spec.to_string(), added_at: 0 }
    }

    #[test]
    fn empty_lists_are_not_allowed() {
        assert_eq!(decide("10.0.0.5", &[], &[], 0), AccessDecision::NotAllowed);
    }

    #[test]
    fn deny_wins_over_matching_allow() {
        let allow = vec![AllowEntry::new("10.0.0.0/8", 0, None)];
        let deny = vec![deny("10.0.0.5")];
        assert_eq!(decide("10.0.0.5", &deny, &allow, 1), AccessDecision::Denied);
        assert_eq!(decide("10.0.0.6", &deny, &allow, 1), AccessDecision::Allowed);
    }

    #[test]
    fn deny_block_covers_its_range() {
        let deny = vec![deny("203.0.113.0/24")];
        assert_eq!(decide("203.0.113.9", &deny, &[], 0), AccessDecision::Denied);
    }

    #[test]
    fn expired_allow_is_treated_as_absent() {
        let allow = vec![AllowEntry::new("10.0.0.5", 0, Some(1_000))];
        assert_eq!(decide("10.0.0.5", &[], &allow, 999), AccessDecision::Allowed);
        assert_eq!(decide("10.0.0.5", &[], &allow, 1_000), AccessDecision::NotAllowed);
    }

    #[test]
    fn any_active_match_allows_even_after_an_expired_one() {
        let allow = vec![
            AllowEntry::new("10.0.0.0/24", 0, Some(10)),
            AllowEntry::new("10.0.0.5", 0, None),
        ];
        assert_eq!(decide("10.0.0.5", &[], &allow, 50), AccessDecision::Allowed);
    }

    #[test]
    fn decision_strings() {
        assert_eq!(AccessDecision::NotAllowed.to_string(), "not_allowed");
        assert_eq!(
            serde_json::to_string(&AccessDecision::Denied).unwrap(),
            "\"denied\""
        );
        assert!(AccessDecision::Allowed.allowed());
        assert!(!AccessDecision::NotAllowed.allowed());
    }

    #[tokio::test]
    async fn evaluate_reads_lists_and_uses_the_clock() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ListStore::new(
            dir.path().join("data"),
            dir.path().join("logs"),
            dir.path().join("backups"),
        ));
        store
            .save(ListName::Allow, &[AllowEntry::new("192.168.1.0/24", 1_000, Some(500))])
            .await
            .unwrap();

        let mut clock = MockClock::new();
        let mut readings = vec![1_500i64, 1_200];
        clock
            .expect_now_millis()
            .times(2)
            .returning(move || readings.pop().unwrap());
        let evaluator = AccessEvaluator::new(store, Arc::new(clock));

        assert_eq!(evaluator.evaluate("192.168.1.42").await, AccessDecision::Allowed);
        assert_eq!(evaluator.evaluate("192.168.1.42").await, AccessDecision::NotAllowed);
    }
}
