//! # redlimit
//!
//! Distributed rate limiting and abuse mitigation for request-handling paths.
//!
//! A [`RateLimiter`] answers one question per call: is this identifier allowed
//! to proceed right now, and if not, when can it retry? State lives in a shared
//! counter store (Redis in production) so every instance of a service enforces
//! the same quota. When the store is unreachable the limiter degrades to a
//! conservative in-process fallback instead of failing requests.
//!
//! ## Features
//!
//! - **Three algorithms**: sliding window (default), token bucket with burst
//!   capacity, fixed window
//! - **Atomic store operations**: MULTI pipelines and a Lua script on Redis
//! - **Graceful degradation**: in-process fallback while Redis is down,
//!   explicit fail-open / fail-closed switch on store errors
//! - **Abuse mitigation**: violation history and temporary bans
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use redlimit::{Config, RateLimitOptions, RateLimiter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let limiter = RateLimiter::connect(&config).await?;
//!
//!     let result = limiter
//!         .check_limit(&RateLimitOptions::new("user:42", 100, 60_000))
//!         .await?;
//!
//!     if !result.allowed {
//!         println!("retry in {:?}s", result.retry_after);
//!     }
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod storage;
pub mod utils;

// Re-export main types
pub use config::{Config, FallbackConfig, RateLimiterConfig, RedisConfig, ViolationConfig};
pub use core::rate_limiter::{
    Algorithm, BanStatus, DEFAULT_HISTORY_LIMIT, DecisionSource, FallbackLimiter,
    IdentifierBuilder, RateLimitOptions, RateLimitResult, RateLimiter, RateLimiterBuilder,
    UNLIMITED, UsageStats, ViolationRecord,
};
pub use storage::{BucketState, CounterStore, MemoryStore};
#[cfg(feature = "redis")]
pub use storage::redis::RedisStore;
pub use utils::clock::{Clock, ManualClock, SystemClock};
pub use utils::error::{LimiterError, Result};

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
