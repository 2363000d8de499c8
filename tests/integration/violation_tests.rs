//! Violation tracking and bans

use crate::common::{START_MS, TestLimiter};
use redlimit::{Clock, DEFAULT_HISTORY_LIMIT, RateLimiterConfig, ViolationRecord};
use std::time::Duration;

fn config(max_violations: u32, max_records: usize) -> RateLimiterConfig {
    let mut config = RateLimiterConfig::default();
    config.violations.window_ms = 60_000;
    config.violations.max_violations_before_ban = max_violations;
    config.violations.ban_duration_ms = 120_000;
    config.violations.max_records = max_records;
    config
}

fn violation(t: &TestLimiter, attempted: u64) -> ViolationRecord {
    ViolationRecord::new("ip:198.51.100.4", "/login", 5, attempted, t.clock.now_ms())
}

#[tokio::test]
async fn test_violations_inside_window_trigger_ban() {
    let t = TestLimiter::with_config(config(3, 100));

    assert!(!t.limiter.record_violation(&violation(&t, 6)).await.unwrap());
    t.clock.advance(1_000);
    assert!(!t.limiter.record_violation(&violation(&t, 7)).await.unwrap());
    t.clock.advance(1_000);
    assert!(t.limiter.record_violation(&violation(&t, 8)).await.unwrap());

    let status = t.limiter.is_banned("ip:198.51.100.4").await.unwrap();
    assert!(status.banned);
    assert_eq!(status.until, Some(START_MS + 2_000 + 120_000));

    t.clock.advance(120_000);
    assert!(!t.limiter.is_banned("ip:198.51.100.4").await.unwrap().banned);
}

#[tokio::test]
async fn test_violations_across_windows_do_not_ban() {
    let t = TestLimiter::with_config(config(3, 100));

    for _ in 0..5 {
        assert!(!t.limiter.record_violation(&violation(&t, 6)).await.unwrap());
        t.clock.advance(60_001);
    }
    assert!(!t.limiter.is_banned("ip:198.51.100.4").await.unwrap().banned);
}

#[tokio::test]
async fn test_history_is_most_recent_first_and_capped() {
    let t = TestLimiter::with_config(config(5, 5));

    for attempted in 1..=8 {
        t.limiter
            .record_violation(&violation(&t, attempted))
            .await
            .unwrap();
        t.clock.advance(10);
    }

    let history = t
        .limiter
        .get_violation_history("ip:198.51.100.4", DEFAULT_HISTORY_LIMIT)
        .await
        .unwrap();
    let attempts: Vec<u64> = history.iter().map(|r| r.attempted).collect();
    assert_eq!(attempts, vec![8, 7, 6, 5, 4]);

    let latest = t
        .limiter
        .get_violation_history("ip:198.51.100.4", 2)
        .await
        .unwrap();
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0].endpoint, "/login");
}

#[tokio::test]
async fn test_manual_ban_and_unban() {
    let t = TestLimiter::new();

    assert!(!t.limiter.is_banned("user:3").await.unwrap().banned);
    t.limiter
        .set_ban("user:3", Duration::from_secs(5))
        .await
        .unwrap();
    assert!(t.limiter.is_banned("user:3").await.unwrap().banned);

    t.limiter.remove_ban("user:3").await.unwrap();
    assert!(!t.limiter.is_banned("user:3").await.unwrap().banned);
}
