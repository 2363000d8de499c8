//! Sliding window log
//!
//! Every request is a sorted set member scored by its timestamp. A check
//! prunes entries older than the window, counts the rest and adds itself in
//! one atomic unit. Denied requests are recorded too, so hammering a limit
//! keeps the window full.

use super::LimitAlgorithm;
use crate::core::rate_limiter::keys::KeyBuilder;
use crate::core::rate_limiter::types::{DecisionSource, RateLimitOptions, RateLimitResult};
use crate::storage::CounterStore;
use crate::utils::ceil_secs;
use crate::utils::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

pub(crate) struct SlidingWindow;

#[async_trait]
impl LimitAlgorithm for SlidingWindow {
    async fn check(
        &self,
        store: &dyn CounterStore,
        keys: &KeyBuilder,
        options: &RateLimitOptions,
        now_ms: i64,
    ) -> Result<RateLimitResult> {
        let limit = options.burst_limit();
        let window_start = now_ms - options.window_ms as i64;
        let member = format!("{}-{}", now_ms, Uuid::new_v4());

        let count = store
            .sliding_window_hit(
                &keys.sliding(&options.identifier),
                window_start,
                now_ms,
                &member,
                ceil_secs(options.window_ms),
            )
            .await? as i64;

        let allowed = count < limit;
        Ok(RateLimitResult {
            allowed,
            limit,
            remaining: (limit - count - 1).max(0),
            reset_at: now_ms + options.window_ms as i64,
            retry_after: (!allowed).then(|| ceil_secs(options.window_ms)),
            source: DecisionSource::Store,
        })
    }
}
