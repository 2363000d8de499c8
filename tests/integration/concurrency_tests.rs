//! Concurrent checks against one identifier

use crate::common::TestLimiter;
use futures::future::join_all;
use redlimit::{Algorithm, RateLimitOptions};

const N: usize = 50;

async fn denied_count(t: &TestLimiter, algorithm: Algorithm) -> usize {
    let options = RateLimitOptions::new("hot-key", (N - 1) as i64, 60_000).with_algorithm(algorithm);

    let handles: Vec<_> = (0..N)
        .map(|_| {
            let limiter = t.limiter.clone();
            let options = options.clone();
            tokio::spawn(async move { limiter.check_limit(&options).await })
        })
        .collect();

    join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked").expect("check failed"))
        .filter(|result| !result.allowed)
        .count()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_exactly_one_denial_sliding_window() {
    let t = TestLimiter::new();
    assert_eq!(denied_count(&t, Algorithm::SlidingWindow).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_exactly_one_denial_token_bucket() {
    let t = TestLimiter::new();
    assert_eq!(denied_count(&t, Algorithm::TokenBucket).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_exactly_one_denial_fixed_window() {
    let t = TestLimiter::new();
    assert_eq!(denied_count(&t, Algorithm::FixedWindow).await, 1);
}
