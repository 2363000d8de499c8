//! End-to-end tests against a live Redis server

use crate::skip_without_env;
use redlimit::{
    Algorithm, Config, CounterStore, RateLimitOptions, RateLimiter, RedisConfig, RedisStore,
    ViolationRecord,
};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Limiter on `REDIS_URL` with a prefix unique to this test run
async fn redis_limiter() -> (RateLimiter, RedisStore) {
    let mut config = Config::default();
    config.redis = RedisConfig {
        url: std::env::var("REDIS_URL").unwrap(),
        ..RedisConfig::default()
    };
    config.limiter.key_prefix = format!("redlimit-test:{}:", Uuid::new_v4());

    let store = RedisStore::connect(&config.redis).await.unwrap();
    assert!(store.is_connected(), "REDIS_URL is set but Redis is unreachable");

    let limiter = RateLimiter::new(Arc::new(store.clone()), config.limiter.clone());
    (limiter, store)
}

#[tokio::test]
#[ignore]
async fn test_redis_sliding_window_sequence() {
    skip_without_env!("REDIS_URL");
    let (limiter, _) = redis_limiter().await;
    let options = RateLimitOptions::new("user:1", 5, 60_000);

    for expected_remaining in [4, 3, 2, 1, 0] {
        let result = limiter.check_limit(&options).await.unwrap();
        assert!(result.allowed);
        assert_eq!(result.remaining, expected_remaining);
    }
    let denied = limiter.check_limit(&options).await.unwrap();
    assert!(!denied.allowed);
    assert_eq!(denied.retry_after, Some(60));

    limiter.reset("user:1").await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_redis_token_bucket_burst() {
    skip_without_env!("REDIS_URL");
    let (limiter, _) = redis_limiter().await;
    let options = RateLimitOptions::new("key:1", 10, 60_000)
        .with_algorithm(Algorithm::TokenBucket)
        .with_burst_multiplier(2.0);

    for _ in 0..20 {
        assert!(limiter.check_limit(&options).await.unwrap().allowed);
    }
    assert!(!limiter.check_limit(&options).await.unwrap().allowed);

    limiter.reset("key:1").await.unwrap();
    assert!(limiter.check_limit(&options).await.unwrap().allowed);
    limiter.reset("key:1").await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_redis_fixed_window_and_reset() {
    skip_without_env!("REDIS_URL");
    let (limiter, _) = redis_limiter().await;
    let options = RateLimitOptions::new("ip:1", 2, 60_000).with_algorithm(Algorithm::FixedWindow);

    limiter.check_limit(&options).await.unwrap();
    limiter.check_limit(&options).await.unwrap();
    assert!(!limiter.check_limit(&options).await.unwrap().allowed);

    limiter.reset("ip:1").await.unwrap();
    assert!(limiter.check_limit(&options).await.unwrap().allowed);
    limiter.reset("ip:1").await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_redis_violations_and_bans() {
    skip_without_env!("REDIS_URL");
    let (limiter, store) = redis_limiter().await;
    let threshold = limiter.config().violations.max_violations_before_ban as u64;

    let mut banned = false;
    for attempted in 1..=threshold {
        let record = ViolationRecord::new(
            "ip:2",
            "/login",
            5,
            attempted,
            chrono::Utc::now().timestamp_millis(),
        );
        banned = limiter.record_violation(&record).await.unwrap();
    }
    assert!(banned);
    assert!(limiter.is_banned("ip:2").await.unwrap().banned);

    let history = limiter.get_violation_history("ip:2", 3).await.unwrap();
    assert_eq!(history.len(), 3);

    limiter.remove_ban("ip:2").await.unwrap();
    assert!(!limiter.is_banned("ip:2").await.unwrap().banned);

    limiter
        .set_ban("ip:2", Duration::from_millis(1_500))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1_600)).await;
    assert!(!limiter.is_banned("ip:2").await.unwrap().banned);

    let leftovers = store
        .keys_matching(&format!("{}*", limiter.config().key_prefix))
        .await
        .unwrap();
    store.delete(&leftovers).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_redis_parallel_checks_deny_exactly_one() {
    skip_without_env!("REDIS_URL");
    let (limiter, _) = redis_limiter().await;
    let limiter = Arc::new(limiter);
    let n = 40;
    let options = RateLimitOptions::new("hot", n - 1, 60_000);

    let handles: Vec<_> = (0..n)
        .map(|_| {
            let limiter = limiter.clone();
            let options = options.clone();
            tokio::spawn(async move { limiter.check_limit(&options).await.unwrap() })
        })
        .collect();

    let denied = futures::future::join_all(handles)
        .await
        .into_iter()
        .filter(|r| !r.as_ref().unwrap().allowed)
        .count();
    assert_eq!(denied, 1);

    limiter.reset("hot").await.unwrap();
}
