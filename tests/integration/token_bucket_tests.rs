//! Token bucket behaviour

use crate::common::{START_MS, TestLimiter};
use redlimit::{Algorithm, CounterStore, RateLimitOptions};

fn options() -> RateLimitOptions {
    RateLimitOptions::new("api:key-1", 10, 1_000)
        .with_algorithm(Algorithm::TokenBucket)
        .with_burst_multiplier(2.0)
}

#[tokio::test]
async fn test_burst_then_refill() {
    let t = TestLimiter::new();

    for i in 0..20 {
        let result = t.limiter.check_limit(&options()).await.unwrap();
        assert!(result.allowed, "request {} should fit the burst", i + 1);
        assert_eq!(result.limit, 20);
        assert_eq!(result.remaining, 19 - i);
    }

    let denied = t.limiter.check_limit(&options()).await.unwrap();
    assert!(!denied.allowed);
    assert_eq!(denied.retry_after, Some(1));
    assert_eq!(denied.reset_at, START_MS + 2_000);

    // 100ms at 10 tokens/s refills exactly one token
    t.clock.advance(100);
    assert!(t.limiter.check_limit(&options()).await.unwrap().allowed);
    assert!(!t.limiter.check_limit(&options()).await.unwrap().allowed);
}

#[tokio::test]
async fn test_idle_bucket_resets_to_full() {
    let t = TestLimiter::new();

    for _ in 0..20 {
        t.limiter.check_limit(&options()).await.unwrap();
    }
    t.clock.advance(1_000);

    let result = t.limiter.check_limit(&options()).await.unwrap();
    assert!(result.allowed);
    assert_eq!(result.remaining, 19);
}

#[tokio::test]
async fn test_corrupt_state_is_replaced_by_full_bucket() {
    let t = TestLimiter::new();
    t.store
        .set_with_expiry("ratelimit:bucket:api:key-1", "{not json", 60_000)
        .await
        .unwrap();

    let result = t.limiter.check_limit(&options()).await.unwrap();
    assert!(result.allowed);
    assert_eq!(result.remaining, 19);
}

#[tokio::test]
async fn test_persisted_state_shape() {
    let t = TestLimiter::new();
    t.limiter.check_limit(&options()).await.unwrap();

    let ttl = t.store.pttl("ratelimit:bucket:api:key-1").await.unwrap();
    assert_eq!(ttl, 1_000);
}
