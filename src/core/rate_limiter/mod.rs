//! Distributed rate limiting
//!
//! This module provides the [`RateLimiter`] facade. Decisions are made by one
//! of three algorithm engines against a shared [`CounterStore`], or by the
//! in-process [`FallbackLimiter`] while the store is unreachable.
//!
//! [`CounterStore`]: crate::storage::CounterStore

mod algorithms;
mod fallback;
mod keys;
mod limiter;
mod types;
mod violations;


pub use fallback::FallbackLimiter;
pub use keys::IdentifierBuilder;
pub use limiter::{RateLimiter, RateLimiterBuilder};
pub use types::{
    Algorithm, BanStatus, DEFAULT_HISTORY_LIMIT, DecisionSource, RateLimitOptions,
    RateLimitResult, UNLIMITED, UsageStats, ViolationRecord,
};
