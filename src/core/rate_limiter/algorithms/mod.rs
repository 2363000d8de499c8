//! Algorithm engines
//!
//! Each engine maps one check onto a single atomic store operation and turns
//! the reply into a [`RateLimitResult`].

mod fixed_window;
mod sliding_window;
mod token_bucket;

use super::keys::KeyBuilder;
use super::types::{Algorithm, RateLimitOptions, RateLimitResult};
use crate::storage::CounterStore;
use crate::utils::error::Result;
use async_trait::async_trait;

pub(crate) use fixed_window::FixedWindow;
pub(crate) use sliding_window::SlidingWindow;
pub(crate) use token_bucket::TokenBucket;

/// A rate limiting engine
#[async_trait]
pub(crate) trait LimitAlgorithm: Send + Sync {
    /// Count one request against `options` at `now_ms`
    async fn check(
        &self,
        store: &dyn CounterStore,
        keys: &KeyBuilder,
        options: &RateLimitOptions,
        now_ms: i64,
    ) -> Result<RateLimitResult>;
}

impl Algorithm {
    pub(crate) fn engine(self) -> &'static dyn LimitAlgorithm {
        match self {
            Self::SlidingWindow => &SlidingWindow,
            Self::TokenBucket => &TokenBucket,
            Self::FixedWindow => &FixedWindow,
        }
    }
}
