use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::core::clock::Clock;
use crate::storage::{AllowEntry, ListName, ListStore};
use crate::utils::{GateError, GateResult};

/// Periodically removes expired entries from the allow list
pub struct ExpirySweeper {
    store: Arc<ListStore>,
    clock: Arc<dyn Clock>,
}

impl ExpirySweeper {
    pub fn new(store: Arc<ListStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Runs one sweep and returns how many entries were removed
    ///
    /// The list is only rewritten when something expired.
    pub async fn sweep_once(&self) -> GateResult<usize> {
        let guard = self.store.lock(ListName::Allow).await;
        let entries: Vec<AllowEntry> = guard.load().await;
        let now = self.clock.now_millis();

        let before = entries.len();
        let kept: Vec<AllowEntry> = entries.into_iter().filter(|e| e.is_active(now)).collect();
        let removed = before - kept.len();

        if removed > 0 {
            guard.save(&kept).await?;
            metrics::counter!("gate_expired_entries_removed_total", removed as u64);
            tracing::info!(removed, "Cleaned up expired allow entries");
        }

        Ok(removed)
    }

    /// Spawns the sweep loop on the current runtime; a zero period is rejected
    pub fn spawn(self: Arc<Self>, period: Duration) -> GateResult<JoinHandle<()>> {
        if period.is_zero() {
            return Err(GateError::InvalidInput(
                "sweeper.interval_seconds must be positive".to_string(),
            ));
        }

        Ok(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(e) = self.sweep_once().await {
                    tracing::error!(error = %e, "Cleanup error");
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::MockClock;

    fn fixed_clock(now: i64) -> Arc<dyn Clock> {
        let mut clock = MockClock::new();
        clock.expect_now_millis().return_const(now);
        Arc::new(clock)
    }

    fn store_in(dir: &std::path::Path) -> Arc<ListStore> {
        Arc::new(ListStore::new(
            dir.join("data"),
            dir.join("logs"),
            dir.join("backups"),
        ))
    }

    #[tokio::test]
    async fn removes_only_expired_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store
            .save(
                ListName::Allow,
                &[
                    AllowEntry::new("10.0.0.1", 0, Some(100)),
                    AllowEntry::new("10.0.0.2", 0, None),
                    AllowEntry::new("10.0.0.3", 0, Some(1_000)),
                    AllowEntry::new("10.0.0.4", 0, Some(500)),
                ],
            )
            .await
            .unwrap();

        let sweeper = ExpirySweeper::new(store.clone(), fixed_clock(500));
        assert_eq!(sweeper.sweep_once().await.unwrap(), 2);

        let left: Vec<AllowEntry> = store.load(ListName::Allow).await;
        let ips: Vec<&str> = left.iter().map(|e| e.ip_or_cidr.as_str()).collect();
        assert_eq!(ips, vec!["10.0.0.2", "10.0.0.3"]);
        assert!(left.iter().all(|e| e.is_active(500)));
    }

    #[tokio::test]
    async fn nothing_expired_means_no_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store
            .save(ListName::Allow, &[AllowEntry::new("10.0.0.2", 0, None)])
            .await
            .unwrap();

        let sweeper = ExpirySweeper::new(store.clone(), fixed_clock(10_000));
        assert_eq!(sweeper.sweep_once().await.unwrap(), 0);

        // A rewrite would have produced a backup of the first save
        let backups = std::fs::read_dir(store.backup_dir()).unwrap().count();
        assert_eq!(backups, 0);
    }

    #[tokio::test]
    async fn spawned_loop_sweeps_each_period() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store
            .save(ListName::Allow, &[AllowEntry::new("10.0.0.1", 0, Some(1))])
            .await
            .unwrap();

        let sweeper = Arc::new(ExpirySweeper::new(store.clone(), fixed_clock(10)));
        let handle = sweeper.spawn(Duration::from_millis(20)).unwrap();

        let mut left: Vec<AllowEntry> = store.load(ListName::Allow).await;
        for _ in 0..100 {
            if left.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            left = store.load(ListName::Allow).await;
        }
        handle.abort();

        assert!(left.is_empty());
    }

    #[tokio::test]
    async fn zero_period_is_rejected_before_spawning() {
        let dir = tempfile::tempdir().unwrap();
        let sweeper = Arc::new(ExpirySweeper::new(store_in(dir.path()), fixed_clock(0)));
        assert!(matches!(
            sweeper.spawn(Duration::ZERO),
            Err(GateError::InvalidInput(_))
        ));
    }
}
