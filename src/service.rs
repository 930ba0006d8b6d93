use std::sync::Arc;

use crate::core::{cidr, AccessDecision, AccessEvaluator, Clock};
use crate::storage::{AccessAttempt, AllowEntry, DenyEntry, ListName, ListStore};
use crate::utils::{log_access_decision, log_admin_event, GateError, GateResult};

/// Number of attempts returned by [`GateService::list_attempts`]
pub const RECENT_ATTEMPTS: usize = 50;

/// Gate and admin operations over the persisted lists
///
/// Every operation re-reads the lists it needs, so the latest admin action
/// is always reflected. Mutations go through the store's per-list lock.
pub struct GateService {
    /// List persistence shared with the sweeper
    store: Arc<ListStore>,
    /// Deny/allow evaluation
    evaluator: AccessEvaluator,
    /// Time source for entry timestamps and expiry
    clock: Arc<dyn Clock>,
}

impl GateService {
    /// Creates a new gate service
    pub fn new(store: Arc<ListStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            evaluator: AccessEvaluator::new(store.clone(), clock.clone()),
            store,
            clock,
        }
    }

    pub fn store(&self) -> &Arc<ListStore> {
        &self.store
    }

    /// Decides whether `ip` may pass the gate
    pub async fn evaluate(&self, ip: &str) -> AccessDecision {
        let decision = self.evaluator.evaluate(ip).await;
        log_access_decision(ip, decision);
        metrics::increment_counter!("gate_decisions_total", "decision" => decision.as_str());
        decision
    }

    /// Persists a new attempt for a visitor who was neither allowed nor denied
    ///
    /// The attempt is stored before the audit line is written; a failed
    /// audit append is logged and does not undo the attempt.
    pub async fn record_attempt(&self, ip: &str, user_agent: &str) -> GateResult<AccessAttempt> {
        let attempt = AccessAttempt::new(ip, user_agent);
        {
            let guard = self.store.lock(ListName::Attempts).await;
            let mut attempts: Vec<AccessAttempt> = guard.load().await;
            attempts.push(attempt.clone());
            guard.save(&attempts).await?;
        }

        if let Err(e) = self.store.append_audit(&attempt.audit_line()).await {
            tracing::warn!(error = %e, attempt_id = %attempt.id, "failed to append audit log");
        }

        metrics::increment_counter!("gate_attempts_logged_total");
        tracing::info!(attempt_id = %attempt.id, ip = %ip, "access attempt logged");
        Ok(attempt)
    }

    /// The most recent attempts in stored order
    pub async fn list_attempts(&self) -> Vec<AccessAttempt> {
        let attempts: Vec<AccessAttempt> = self.store.load(ListName::Attempts).await;
        let skip = attempts.len().saturating_sub(RECENT_ATTEMPTS);
        attempts.into_iter().skip(skip).collect()
    }

    /// Adds or replaces the allow entry for `ip_or_cidr`
    pub async fn allow(&self, ip_or_cidr: &str, ttl_ms: Option<i64>) -> GateResult<AllowEntry> {
        validate_spec(ip_or_cidr)?;
        validate_ttl(ttl_ms)?;

        let entry = AllowEntry::new(ip_or_cidr, self.clock.now_millis(), ttl_ms);
        self.upsert_allow(entry.clone()).await?;

        log_admin_event("allow", true, Some(&format!("{} allowed", ip_or_cidr)));
        Ok(entry)
    }

    /// Allows the IP of a logged attempt
    pub async fn approve(&self, attempt_id: &str, ttl_ms: Option<i64>) -> GateResult<AllowEntry> {
        validate_ttl(ttl_ms)?;

        let attempts: Vec<AccessAttempt> = self.store.load(ListName::Attempts).await;
        let attempt = attempts
            .into_iter()
            .find(|a| a.id == attempt_id)
            .ok_or_else(|| GateError::AttemptNotFound(attempt_id.to_string()))?;

        let mut entry = AllowEntry::new(&attempt.ip, self.clock.now_millis(), ttl_ms);
        entry.approved_from = Some(attempt.id.clone());
        self.upsert_allow(entry.clone()).await?;

        log_admin_event(
            "approve",
            true,
            Some(&format!("attempt {} approved for {}", attempt.id, attempt.ip)),
        );
        Ok(entry)
    }

    /// Removes the allow entry stored under exactly `ip_or_cidr`
    ///
    /// No CIDR containment is applied; returns the number of entries removed.
    pub async fn revoke(&self, ip_or_cidr: &str) -> GateResult<usize> {
        let guard = self.store.lock(ListName::Allow).await;
        let entries: Vec<AllowEntry> = guard.load().await;
        let before = entries.len();
        let kept: Vec<AllowEntry> = entries
            .into_iter()
            .filter(|e| e.ip_or_cidr != ip_or_cidr)
            .collect();
        let removed = before - kept.len();

        if removed > 0 {
            guard.save(&kept).await?;
        }

        log_admin_event("revoke", true, Some(&format!("{} removed for {}", removed, ip_or_cidr)));
        Ok(removed)
    }

    /// Adds `ip_or_cidr` to the deny list unless it is already there
    ///
    /// Returns whether a new entry was added.
    pub async fn deny(&self, ip_or_cidr: &str) -> GateResult<bool> {
        validate_spec(ip_or_cidr)?;

        let guard = self.store.lock(ListName::Deny).await;
        let mut entries: Vec<DenyEntry> = guard.load().await;
        if entries.iter().any(|e| e.ip_or_cidr == ip_or_cidr) {
            return Ok(false);
        }

        entries.push(DenyEntry {
            ip_or_cidr: ip_or_cidr.to_string(),
            added_at: self.clock.now_millis(),
        });
        guard.save(&entries).await?;

        log_admin_event("deny", true, Some(&format!("{} denied", ip_or_cidr)));
        Ok(true)
    }

    pub async fn list_allowed(&self) -> Vec<AllowEntry> {
        self.store.load(ListName::Allow).await
    }

    pub async fn list_denied(&self) -> Vec<DenyEntry> {
        self.store.load(ListName::Deny).await
    }

    async fn upsert_allow(&self, entry: AllowEntry) -> GateResult<()> {
        let guard = self.store.lock(ListName::Allow).await;
        let entries: Vec<AllowEntry> = guard.load().await;
        let mut kept: Vec<AllowEntry> = entries
            .into_iter()
            .filter(|e| e.ip_or_cidr != entry.ip_or_cidr)
            .collect();
        kept.push(entry);
        guard.save(&kept).await
    }
}

fn validate_spec(ip_or_cidr: &str) -> GateResult<()> {
    if cidr::is_valid_spec(ip_or_cidr) {
        Ok(())
    } else {
        Err(GateError::InvalidInput(format!(
            "'{}' is not an IP address or IPv4 CIDR block",
            ip_or_cidr
        )))
    }
}

fn validate_ttl(ttl_ms: Option<i64>) -> GateResult<()> {
    match ttl_ms {
        Some(ttl) if ttl < 0 => Err(GateError::InvalidInput(
            "ttlMs must not be negative".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SystemClock;

    fn service_in(dir: &std::path::Path) -> GateService {
        let store = Arc::new(ListStore::new(
            dir.join("data"),
            dir.join("logs"),
            dir.join("backups"),
        ));
        GateService::new(store, Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn allow_twice_keeps_one_entry_with_latest_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path());
        service.allow("10.0.0.5", Some(60_000)).await.unwrap();
        let second = service.allow("10.0.0.5", None).await.unwrap();

        let entries = service.list_allowed().await;
        assert_eq!(entries, vec![second]);
        assert_eq!(entries[0].expires_at, None);
    }

    #[tokio::test]
    async fn approve_unknown_attempt_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path());
        let result = service.approve("missing", None).await;
        assert!(matches!(result, Err(GateError::AttemptNotFound(id)) if id == "missing"));
        assert!(service.list_allowed().await.is_empty());
    }

    #[tokio::test]
    async fn approve_keys_entry_by_attempt_ip() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path());
        let attempt = service.record_attempt("10.0.0.5", "curl").await.unwrap();
        let entry = service.approve(&attempt.id, Some(3_600_000)).await.unwrap();

        assert_eq!(entry.ip_or_cidr, "10.0.0.5");
        assert_eq!(entry.approved_from.as_deref(), Some(attempt.id.as_str()));
        assert_eq!(entry.expires_at, Some(entry.added_at + 3_600_000));
    }

    #[tokio::test]
    async fn revoke_is_literal() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path());
        service.allow("192.168.1.0/24", None).await.unwrap();

        assert_eq!(service.revoke("192.168.1.42").await.unwrap(), 0);
        assert_eq!(service.list_allowed().await.len(), 1);
        assert_eq!(service.revoke("192.168.1.0/24").await.unwrap(), 1);
        assert!(service.list_allowed().await.is_empty());
    }

    #[tokio::test]
    async fn deny_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path());
        assert!(service.deny("10.0.0.5").await.unwrap());
        assert!(!service.deny("10.0.0.5").await.unwrap());
        assert_eq!(service.list_denied().await.len(), 1);
    }

    #[tokio::test]
    async fn invalid_specs_and_ttls_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path());
        assert!(matches!(
            service.allow("not-an-ip", None).await,
            Err(GateError::InvalidInput(_))
        ));
        assert!(matches!(
            service.allow("10.0.0.1", Some(-1)).await,
            Err(GateError::InvalidInput(_))
        ));
        assert!(matches!(
            service.deny("10.0.0.0/40").await,
            Err(GateError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn list_attempts_returns_the_last_fifty() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path());
        let attempts: Vec<AccessAttempt> = (0..60)
            .map(|i| AccessAttempt::new(&format!("10.0.0.{}", i), "ua"))
            .collect();
        service.store().save(ListName::Attempts, &attempts).await.unwrap();

        let recent = service.list_attempts().await;
        assert_eq!(recent.len(), RECENT_ATTEMPTS);
        assert_eq!(recent[0].ip, "10.0.0.10");
        assert_eq!(recent[49].ip, "10.0.0.59");
    }

    #[tokio::test]
    async fn concurrent_allows_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(service_in(dir.path()));
        let tasks: Vec<_> = (0..10)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move { service.allow(&format!("10.1.0.{}", i), None).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(service.list_allowed().await.len(), 10);
    }
}
