//! Shared counter store
//!
//! The limiter never talks to Redis directly. Every algorithm goes through the
//! narrow [`CounterStore`] operation set below, and every operation that
//! performs a read-modify-write is atomic per key in each implementation:
//!
//! - [`redis::RedisStore`]: MULTI pipelines, a Lua script and `INCR`
//! - [`MemoryStore`]: one mutex around the whole keyspace

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use memory::MemoryStore;

use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Persisted token bucket state, stored as JSON
/// (`{"tokens": 3.5, "lastRefill": 1700000000000}`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketState {
    pub tokens: f64,
    pub last_refill: i64,
}

/// Outcome of one token bucket take
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketTake {
    pub allowed: bool,
    /// Tokens left after the take
    pub tokens: f64,
}

impl BucketState {
    /// Decode a stored bucket. Malformed state reads as absent.
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str::<Self>(raw)
            .ok()
            .filter(|state| state.tokens.is_finite())
    }

    /// Refill from `last_refill` to `now_ms`, then take one token if available.
    /// A missing bucket starts full.
    pub fn refill_and_take(
        state: Option<Self>,
        capacity: f64,
        refill_rate: f64,
        now_ms: i64,
    ) -> (Self, BucketTake) {
        let (tokens, last_refill) = match state {
            Some(state) => (state.tokens, state.last_refill),
            None => (capacity, now_ms),
        };

        let elapsed_ms = (now_ms - last_refill).max(0) as f64;
        let mut tokens = (tokens + elapsed_ms / 1000.0 * refill_rate).min(capacity);

        let allowed = tokens >= 1.0;
        if allowed {
            tokens -= 1.0;
        }

        (
            Self {
                tokens,
                last_refill: now_ms,
            },
            BucketTake { allowed, tokens },
        )
    }
}

/// Operations the limiter needs from the shared store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Whether the store is believed reachable. This is a cached flag, not a
    /// live probe.
    fn is_connected(&self) -> bool;

    /// Atomically: drop entries scored below `window_start_ms`, count the
    /// rest, add `member` at `now_ms`, set the key TTL to `ttl_secs`.
    /// Returns the count taken before the insert.
    async fn sliding_window_hit(
        &self,
        key: &str,
        window_start_ms: i64,
        now_ms: i64,
        member: &str,
        ttl_secs: u64,
    ) -> Result<u64>;

    /// Atomically refill the bucket at `key`, take one token if possible, and
    /// persist the new state with a TTL of `ttl_ms`.
    async fn token_bucket_take(
        &self,
        key: &str,
        capacity: f64,
        refill_rate: f64,
        now_ms: i64,
        ttl_ms: u64,
    ) -> Result<BucketTake>;

    /// Atomically increment the counter at `key`. The expiry is set only by
    /// the increment that creates the key.
    async fn increment_window(&self, key: &str, ttl_ms: u64) -> Result<i64>;

    async fn sorted_set_add(&self, key: &str, score: f64, member: &str) -> Result<()>;

    /// Remove members with `min <= score <= max`; returns how many went
    async fn sorted_set_remove_by_score(&self, key: &str, min: f64, max: f64) -> Result<u64>;

    /// Count members with `min <= score <= max`
    async fn sorted_set_count(&self, key: &str, min: f64, max: f64) -> Result<u64>;

    /// Members ordered by descending score, ranks `start..=stop`
    async fn sorted_set_rev_range(&self, key: &str, start: isize, stop: isize)
    -> Result<Vec<String>>;

    /// Keep only the `max_len` highest-scored members
    async fn sorted_set_trim(&self, key: &str, max_len: usize) -> Result<()>;

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<()>;

    async fn set_with_expiry(&self, key: &str, value: &str, ttl_ms: u64) -> Result<()>;

    /// Remaining TTL in milliseconds: `-2` if the key is missing, `-1` if it
    /// has no expiry.
    async fn pttl(&self, key: &str) -> Result<i64>;

    async fn delete(&self, keys: &[String]) -> Result<()>;

    /// Keys matching a glob pattern
    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>>;
}
