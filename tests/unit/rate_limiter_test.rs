use ipgate::config::RateLimitConfig;
use ipgate::core::RateLimiter;
use ipgate::utils::{GateError, GateResult};

use crate::test_utils::random_ip;

#[test_log::test]
fn test_rate_limiter() -> GateResult<()> {
    // Create a rate limiter with a low threshold for testing
    let config = RateLimitConfig {
        max_requests: 5,
        window_seconds: 300,
    };

    let rate_limiter = RateLimiter::new(config)?;

    // Test IP
    let test_ip = "127.0.0.1";

    // Make requests up to the limit
    for i in 0..5 {
        let result = rate_limiter.check_rate_limit(test_ip);
        assert!(result.is_ok(), "Request {} should be allowed", i);
    }

    // The next request should be rate limited
    let result = rate_limiter.check_rate_limit(test_ip);
    assert!(
        matches!(result, Err(GateError::RateLimitExceeded(ref ip)) if ip == test_ip),
        "Request should be rate limited"
    );

    // Another client is unaffected
    rate_limiter.check_rate_limit(&random_ip())?;

    rate_limiter.retain_recent();
    Ok(())
}

#[test_log::test]
fn test_quota_refills_over_the_window() -> GateResult<()> {
    // One request per second
    let rate_limiter = RateLimiter::new(RateLimitConfig {
        max_requests: 1,
        window_seconds: 1,
    })?;

    rate_limiter.check_rate_limit("10.0.0.1")?;
    assert!(rate_limiter.check_rate_limit("10.0.0.1").is_err());

    std::thread::sleep(std::time::Duration::from_millis(1_100));
    rate_limiter.check_rate_limit("10.0.0.1")?;
    Ok(())
}
