//! Token bucket
//!
//! Capacity is `floor(limit * burst_multiplier)`; the bucket refills at
//! `limit` tokens per window. State expires after one idle window, after
//! which the bucket starts full again.

use super::LimitAlgorithm;
use crate::core::rate_limiter::keys::KeyBuilder;
use crate::core::rate_limiter::types::{DecisionSource, RateLimitOptions, RateLimitResult};
use crate::storage::CounterStore;
use crate::utils::ceil_secs;
use crate::utils::error::Result;
use async_trait::async_trait;

pub(crate) struct TokenBucket;

#[async_trait]
impl LimitAlgorithm for TokenBucket {
    async fn check(
        &self,
        store: &dyn CounterStore,
        keys: &KeyBuilder,
        options: &RateLimitOptions,
        now_ms: i64,
    ) -> Result<RateLimitResult> {
        let capacity = options.burst_limit();
        let refill_rate = options.limit as f64 / (options.window_ms as f64 / 1000.0);

        let take = store
            .token_bucket_take(
                &keys.bucket(&options.identifier),
                capacity as f64,
                refill_rate,
                now_ms,
                options.window_ms,
            )
            .await?;

        let (reset_at, retry_after) = if refill_rate > 0.0 {
            let to_full_ms = ((capacity as f64 - take.tokens).max(0.0) * 1000.0 / refill_rate).ceil();
            let retry = ((1.0 - take.tokens) / refill_rate).ceil().max(1.0) as u64;
            (now_ms + to_full_ms as i64, retry)
        } else {
            // A zero limit never refills
            (
                now_ms + options.window_ms as i64,
                ceil_secs(options.window_ms).max(1),
            )
        };

        Ok(RateLimitResult {
            allowed: take.allowed,
            limit: capacity,
            remaining: take.tokens.floor().max(0.0) as i64,
            reset_at,
            retry_after: (!take.allowed).then_some(retry_after),
            source: DecisionSource::Store,
        })
    }
}
