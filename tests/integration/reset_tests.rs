//! Reset behaviour

use crate::common::TestLimiter;
use redlimit::{Algorithm, CounterStore, RateLimitOptions};

#[tokio::test]
async fn test_reset_restores_full_quota_for_every_algorithm() {
    let t = TestLimiter::new();

    for algorithm in [
        Algorithm::SlidingWindow,
        Algorithm::TokenBucket,
        Algorithm::FixedWindow,
    ] {
        let options = RateLimitOptions::new("user:7", 2, 60_000).with_algorithm(algorithm);
        t.limiter.check_limit(&options).await.unwrap();
        t.limiter.check_limit(&options).await.unwrap();
        assert!(!t.limiter.check_limit(&options).await.unwrap().allowed);

        t.limiter.reset("user:7").await.unwrap();

        let result = t.limiter.check_limit(&options).await.unwrap();
        assert!(result.allowed, "{} not reset", algorithm);
        assert_eq!(result.remaining, 1);
    }
}

#[tokio::test]
async fn test_reset_removes_every_fixed_shard() {
    let t = TestLimiter::new();
    let options = RateLimitOptions::new("user:7", 10, 1_000).with_algorithm(Algorithm::FixedWindow);

    // A shard lives for one window from its first hit, so one created late
    // in a window is still around after the next window opens
    t.clock.advance(900);
    t.limiter.check_limit(&options).await.unwrap();
    t.clock.advance(100);
    t.limiter.check_limit(&options).await.unwrap();
    assert_eq!(
        t.store
            .keys_matching("ratelimit:fixed:user:7:*")
            .await
            .unwrap()
            .len(),
        2
    );

    t.limiter.reset("user:7").await.unwrap();
    assert!(
        t.store
            .keys_matching("ratelimit:fixed:user:7:*")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_reset_leaves_other_identifiers_alone() {
    let t = TestLimiter::new();
    let target = RateLimitOptions::new("a*", 1, 60_000).with_algorithm(Algorithm::FixedWindow);
    let bystander = RateLimitOptions::new("ab", 1, 60_000).with_algorithm(Algorithm::FixedWindow);

    t.limiter.check_limit(&target).await.unwrap();
    t.limiter.check_limit(&bystander).await.unwrap();

    t.limiter.reset("a*").await.unwrap();

    assert!(t.limiter.check_limit(&target).await.unwrap().allowed);
    assert!(!t.limiter.check_limit(&bystander).await.unwrap().allowed);
}

#[tokio::test]
async fn test_reset_spares_identifiers_nested_under_the_target() {
    let t = TestLimiter::new();
    let target = RateLimitOptions::new("user:1", 1, 60_000).with_algorithm(Algorithm::FixedWindow);
    let nested = RateLimitOptions::new("user:1:endpoint:/login", 1, 60_000)
        .with_algorithm(Algorithm::FixedWindow);

    t.limiter.check_limit(&target).await.unwrap();
    assert!(t.limiter.check_limit(&nested).await.unwrap().allowed);
    assert!(!t.limiter.check_limit(&nested).await.unwrap().allowed);

    t.limiter.reset("user:1").await.unwrap();

    assert!(t.limiter.check_limit(&target).await.unwrap().allowed);
    assert!(!t.limiter.check_limit(&nested).await.unwrap().allowed);
}
