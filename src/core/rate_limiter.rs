use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;

use crate::config::RateLimitConfig;
use crate::core::clock::{Clock, SystemClock};
use crate::utils::{GateError, GateResult};

/// Per-client-IP request ceiling for the gate and admin routes
///
/// Fixed-window counters: the first request from an IP opens a window of
/// `window_seconds`, and at most `max_requests` are accepted until it closes.
pub struct RateLimiter {
    counters: DashMap<String, Window>,
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: i64,
    count: u32,
}

impl RateLimiter {
    /// Create a new rate limiter instance
    pub fn new(config: RateLimitConfig) -> GateResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> GateResult<Self> {
        if config.max_requests == 0 {
            return Err(GateError::InvalidInput(
                "rate_limit.max_requests must be at least 1".to_string(),
            ));
        }
        if config.window_seconds == 0 {
            return Err(GateError::InvalidInput(
                "rate_limit.window_seconds must be positive".to_string(),
            ));
        }

        Ok(Self {
            counters: DashMap::new(),
            config,
            clock,
        })
    }

    fn window_millis(&self) -> i64 {
        i64::try_from(self.config.window().as_millis()).unwrap_or(i64::MAX)
    }

    /// Check if a request from an IP is within its quota
    pub fn check_rate_limit(&self, ip: &str) -> GateResult<()> {
        let now = self.clock.now_millis();
        let window = self.window_millis();

        let accepted = {
            let mut entry = self.counters.entry(ip.to_string()).or_insert(Window {
                started_at: now,
                count: 0,
            });
            if now.saturating_sub(entry.started_at) >= window {
                *entry = Window { started_at: now, count: 0 };
            }
            if entry.count < self.config.max_requests {
                entry.count += 1;
                true
            } else {
                false
            }
        };

        if accepted {
            tracing::debug!(ip = %ip, event = "rate_limit_check");
            Ok(())
        } else {
            tracing::warn!(
                ip = %ip,
                event = "rate_limit_exceeded",
                limit = self.config.max_requests,
                window_seconds = self.config.window_seconds
            );
            metrics::increment_counter!("gate_rate_limited_total");
            Err(GateError::RateLimitExceeded(ip.to_string()))
        }
    }

    /// Drops counters whose window has closed
    pub fn retain_recent(&self) {
        let now = self.clock.now_millis();
        let window = self.window_millis();
        self.counters
            .retain(|_, w| now.saturating_sub(w.started_at) < window);
    }

    /// Number of client IPs currently holding a counter
    pub fn tracked_clients(&self) -> usize {
        self.counters.len()
    }

    /// Spawns a loop that calls [`RateLimiter::retain_recent`] every `period`
    pub fn spawn_cleanup(self: Arc<Self>, period: Duration) -> GateResult<JoinHandle<()>> {
        if period.is_zero() {
            return Err(GateError::InvalidInput(
                "rate limiter cleanup period must be positive".to_string(),
            ));
        }

        Ok(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let before = self.tracked_clients();
                self.retain_recent();
                tracing::debug!(
                    dropped = before.saturating_sub(self.tracked_clients()),
                    "Rate limiter cleanup"
                );
            }
        }))
    }
}
