//! `CounterStore` implementation for Redis

use super::pool::RedisStore;
use crate::storage::{BucketTake, CounterStore};
use crate::utils::error::Result;
use async_trait::async_trait;

#[async_trait]
impl CounterStore for RedisStore {
    fn is_connected(&self) -> bool {
        self.connected()
    }

    async fn sliding_window_hit(
        &self,
        key: &str,
        window_start_ms: i64,
        now_ms: i64,
        member: &str,
        ttl_secs: u64,
    ) -> Result<u64> {
        self.sliding_window_pipeline(key, window_start_ms, now_ms, member, ttl_secs)
            .await
    }

    async fn token_bucket_take(
        &self,
        key: &str,
        capacity: f64,
        refill_rate: f64,
        now_ms: i64,
        ttl_ms: u64,
    ) -> Result<BucketTake> {
        self.token_bucket_script(key, capacity, refill_rate, now_ms, ttl_ms)
            .await
    }

    async fn increment_window(&self, key: &str, ttl_ms: u64) -> Result<i64> {
        self.increment_script(key, ttl_ms).await
    }

    async fn sorted_set_add(&self, key: &str, score: f64, member: &str) -> Result<()> {
        self.zadd(key, score, member).await
    }

    async fn sorted_set_remove_by_score(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        self.zrem_by_score(key, min, max).await
    }

    async fn sorted_set_count(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        self.zcount(key, min, max).await
    }

    async fn sorted_set_rev_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>> {
        self.zrevrange(key, start, stop).await
    }

    async fn sorted_set_trim(&self, key: &str, max_len: usize) -> Result<()> {
        self.ztrim(key, max_len).await
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<()> {
        self.key_expire(key, ttl_secs).await
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl_ms: u64) -> Result<()> {
        self.pset_ex(key, value, ttl_ms).await
    }

    async fn pttl(&self, key: &str) -> Result<i64> {
        self.key_pttl(key).await
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        self.delete_many(keys).await
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>> {
        self.scan_keys(pattern).await
    }
}
