//! Fixed window behaviour

use crate::common::{START_MS, TestLimiter};
use redlimit::{Algorithm, CounterStore, RateLimitOptions};

fn options() -> RateLimitOptions {
    RateLimitOptions::new("ip:203.0.113.7", 5, 1_000).with_algorithm(Algorithm::FixedWindow)
}

#[tokio::test]
async fn test_counts_within_window() {
    let t = TestLimiter::new();
    t.clock.advance(500);

    for expected_remaining in [4, 3, 2, 1, 0] {
        let result = t.limiter.check_limit(&options()).await.unwrap();
        assert!(result.allowed);
        assert_eq!(result.limit, 5);
        assert_eq!(result.remaining, expected_remaining);
        assert_eq!(result.reset_at, START_MS + 1_000);
    }

    let denied = t.limiter.check_limit(&options()).await.unwrap();
    assert!(!denied.allowed);
    assert_eq!(denied.retry_after, Some(1));
}

#[tokio::test]
async fn test_boundary_allows_two_windows_back_to_back() {
    let t = TestLimiter::new();

    t.clock.advance(999);
    for _ in 0..5 {
        assert!(t.limiter.check_limit(&options()).await.unwrap().allowed);
    }
    assert!(!t.limiter.check_limit(&options()).await.unwrap().allowed);

    t.clock.advance(1);
    for _ in 0..5 {
        assert!(t.limiter.check_limit(&options()).await.unwrap().allowed);
    }
}

#[tokio::test]
async fn test_burst_multiplier_is_ignored() {
    let t = TestLimiter::new();
    let burst = options().with_burst_multiplier(3.0);

    let result = t.limiter.check_limit(&burst).await.unwrap();
    assert_eq!(result.limit, 5);
}

#[tokio::test]
async fn test_shard_expiry_set_once() {
    let t = TestLimiter::new();
    let key = format!("ratelimit:fixed:ip:203.0.113.7:{}", START_MS);

    t.limiter.check_limit(&options()).await.unwrap();
    t.clock.advance(400);
    t.limiter.check_limit(&options()).await.unwrap();

    assert_eq!(t.store.pttl(&key).await.unwrap(), 600);
}
