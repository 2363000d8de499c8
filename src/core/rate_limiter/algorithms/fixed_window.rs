//! Fixed window counter
//!
//! One counter per quantized window. Cheap, but a client can spend two
//! windows' worth of requests across a boundary.

use super::LimitAlgorithm;
use crate::core::rate_limiter::keys::KeyBuilder;
use crate::core::rate_limiter::types::{DecisionSource, RateLimitOptions, RateLimitResult};
use crate::storage::CounterStore;
use crate::utils::ceil_secs;
use crate::utils::error::Result;
use async_trait::async_trait;

pub(crate) struct FixedWindow;

#[async_trait]
impl LimitAlgorithm for FixedWindow {
    async fn check(
        &self,
        store: &dyn CounterStore,
        keys: &KeyBuilder,
        options: &RateLimitOptions,
        now_ms: i64,
    ) -> Result<RateLimitResult> {
        let window_ms = options.window_ms as i64;
        let window_start = now_ms.div_euclid(window_ms) * window_ms;
        let reset_at = window_start + window_ms;

        let count = store
            .increment_window(
                &keys.fixed(&options.identifier, window_start),
                options.window_ms,
            )
            .await?;

        let allowed = count <= options.limit;
        Ok(RateLimitResult {
            allowed,
            limit: options.limit,
            remaining: (options.limit - count).max(0),
            reset_at,
            retry_after: (!allowed).then(|| ceil_secs((reset_at - now_ms) as u64).max(1)),
            source: DecisionSource::Store,
        })
    }
}
