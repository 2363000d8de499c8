//! Sliding window behaviour

use crate::assert_ok;
use crate::common::{START_MS, TestLimiter};
use redlimit::{Algorithm, DecisionSource, RateLimitOptions};

fn options(id: &str) -> RateLimitOptions {
    RateLimitOptions::new(id, 5, 60_000).with_algorithm(Algorithm::SlidingWindow)
}

#[tokio::test]
async fn test_five_per_minute_sequence() {
    let t = TestLimiter::new();

    for expected_remaining in [4, 3, 2, 1, 0] {
        let result = assert_ok!(t.limiter.check_limit(&options("user:1")).await);
        assert!(result.allowed);
        assert_eq!(result.limit, 5);
        assert_eq!(result.remaining, expected_remaining);
        assert_eq!(result.reset_at, START_MS + 60_000);
        assert_eq!(result.retry_after, None);
        assert_eq!(result.source, DecisionSource::Store);
    }

    let denied = assert_ok!(t.limiter.check_limit(&options("user:1")).await);
    assert!(!denied.allowed);
    assert_eq!(denied.remaining, 0);
    assert_eq!(denied.retry_after, Some(60));
}

#[tokio::test]
async fn test_old_entries_age_out() {
    let t = TestLimiter::new();

    for _ in 0..3 {
        assert!(t.limiter.check_limit(&options("u")).await.unwrap().allowed);
    }
    t.clock.advance(30_000);
    for _ in 0..2 {
        assert!(t.limiter.check_limit(&options("u")).await.unwrap().allowed);
    }
    assert!(!t.limiter.check_limit(&options("u")).await.unwrap().allowed);

    // The first three entries leave the window; three from t+30s remain
    t.clock.advance(30_001);
    let result = t.limiter.check_limit(&options("u")).await.unwrap();
    assert!(result.allowed);
    assert_eq!(result.remaining, 1);
}

#[tokio::test]
async fn test_entry_exactly_one_window_old_still_counts() {
    let t = TestLimiter::new();

    for _ in 0..4 {
        assert!(t.limiter.check_limit(&options("edge")).await.unwrap().allowed);
    }
    // A later hit keeps the set alive past the first entries' window
    t.clock.advance(10_000);
    assert!(t.limiter.check_limit(&options("edge")).await.unwrap().allowed);

    t.clock.set(START_MS + 60_000);
    assert!(!t.limiter.check_limit(&options("edge")).await.unwrap().allowed);

    // The four oldest entries leave; the t+10s hit and the denial remain
    t.clock.advance(1);
    let result = t.limiter.check_limit(&options("edge")).await.unwrap();
    assert!(result.allowed);
    assert_eq!(result.remaining, 2);
}

#[tokio::test]
async fn test_denied_requests_keep_the_window_full() {
    let t = TestLimiter::new();
    let tight = RateLimitOptions::new("u", 1, 10_000);

    assert!(t.limiter.check_limit(&tight).await.unwrap().allowed);
    t.clock.advance(6_000);
    assert!(!t.limiter.check_limit(&tight).await.unwrap().allowed);

    // The first entry has aged out, but the denied one has not
    t.clock.advance(6_000);
    assert!(!t.limiter.check_limit(&tight).await.unwrap().allowed);
}

#[tokio::test]
async fn test_burst_multiplier_raises_ceiling() {
    let t = TestLimiter::new();
    let burst = options("u").with_burst_multiplier(1.5);

    let first = t.limiter.check_limit(&burst).await.unwrap();
    assert_eq!(first.limit, 7);
    assert_eq!(first.remaining, 6);

    for _ in 0..6 {
        assert!(t.limiter.check_limit(&burst).await.unwrap().allowed);
    }
    assert!(!t.limiter.check_limit(&burst).await.unwrap().allowed);
}

#[tokio::test]
async fn test_identifiers_are_isolated() {
    let t = TestLimiter::new();
    let one = RateLimitOptions::new("a", 1, 60_000);

    assert!(t.limiter.check_limit(&one).await.unwrap().allowed);
    assert!(!t.limiter.check_limit(&one).await.unwrap().allowed);

    let other = RateLimitOptions::new("b", 1, 60_000);
    assert!(t.limiter.check_limit(&other).await.unwrap().allowed);
}

#[tokio::test]
async fn test_usage_stats_count_trailing_hour_and_day() {
    let t = TestLimiter::new();
    let long = RateLimitOptions::new("u", 1000, 86_400_000);

    for _ in 0..3 {
        t.limiter.check_limit(&long).await.unwrap();
    }
    t.clock.advance(2 * 3_600_000);
    for _ in 0..2 {
        t.limiter.check_limit(&long).await.unwrap();
    }

    let stats = t.limiter.get_usage_stats("u").await.unwrap();
    assert_eq!(stats.hourly, 2);
    assert_eq!(stats.daily, 5);
}
