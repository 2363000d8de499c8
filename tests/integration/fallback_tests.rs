//! Routing to the in-process fallback while the store is down

use crate::common::TestLimiter;
use redlimit::{Clock, DecisionSource, RateLimitOptions, RateLimiterConfig, ViolationRecord};
use std::time::Duration;

fn config() -> RateLimiterConfig {
    let mut config = RateLimiterConfig::default();
    config.fallback.limit = 3;
    config.fallback.window_ms = 10_000;
    config.fallback.sweep_probability = 0.0;
    config
}

#[tokio::test]
async fn test_outage_uses_fallback_ceiling() {
    let t = TestLimiter::with_config(config());
    t.store.set_connected(false);
    assert!(!t.limiter.is_store_connected());

    // The caller's generous limit does not apply during an outage
    let options = RateLimitOptions::new("user:1", 1_000, 60_000);
    for _ in 0..3 {
        let result = t.limiter.check_limit(&options).await.unwrap();
        assert!(result.allowed);
        assert_eq!(result.source, DecisionSource::Fallback);
        assert_eq!(result.limit, 3);
    }

    let denied = t.limiter.check_limit(&options).await.unwrap();
    assert!(!denied.allowed);
    assert_eq!(denied.retry_after, Some(10));

    t.clock.advance(10_001);
    assert!(t.limiter.check_limit(&options).await.unwrap().allowed);
}

#[tokio::test]
async fn test_recovery_returns_to_store() {
    let t = TestLimiter::with_config(config());
    let options = RateLimitOptions::new("user:1", 2, 60_000);

    t.store.set_connected(false);
    t.limiter.check_limit(&options).await.unwrap();
    assert_eq!(t.limiter.fallback_size(), 1);

    t.store.set_connected(true);
    let result = t.limiter.check_limit(&options).await.unwrap();
    assert_eq!(result.source, DecisionSource::Store);
    // Fallback counts are not carried into the store
    assert_eq!(result.remaining, 1);
}

#[tokio::test]
async fn test_outage_degrades_other_calls() {
    let t = TestLimiter::with_config(config());
    t.limiter
        .set_ban("user:1", Duration::from_secs(60))
        .await
        .unwrap();

    t.store.set_connected(false);

    assert!(!t.limiter.is_banned("user:1").await.unwrap().banned);
    assert!(t
        .limiter
        .get_violation_history("user:1", 10)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(t.limiter.get_usage_stats("user:1").await.unwrap().hourly, 0);

    let record = ViolationRecord::new("user:1", "/x", 1, 2, t.clock.now_ms());
    assert!(!t.limiter.record_violation(&record).await.unwrap());

    // Writes were skipped, so the ban is still there once the store is back
    t.store.set_connected(true);
    assert!(t.limiter.is_banned("user:1").await.unwrap().banned);
    assert!(t
        .limiter
        .get_violation_history("user:1", 10)
        .await
        .unwrap()
        .is_empty());
}
