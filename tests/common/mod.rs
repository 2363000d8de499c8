//! Common test utilities for redlimit
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::common::TestLimiter;
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let t = TestLimiter::new();
//!     t.clock.advance(1_000);
//!     // ...
//! }
//! ```

use redlimit::{ManualClock, MemoryStore, RateLimiter, RateLimiterConfig};
use std::sync::Arc;

/// Fixed start time; a multiple of every window used in the tests
pub const START_MS: i64 = 1_700_000_000_000;

/// A limiter over an in-memory store, with the clock and store exposed
pub struct TestLimiter {
    pub limiter: Arc<RateLimiter>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

impl TestLimiter {
    pub fn new() -> Self {
        Self::with_config(RateLimiterConfig::default())
    }

    pub fn with_config(config: RateLimiterConfig) -> Self {
        let clock = Arc::new(ManualClock::new(START_MS));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let limiter = RateLimiter::builder()
            .store(store.clone())
            .clock(clock.clone())
            .config(config)
            .build()
            .expect("test config is valid");

        Self {
            limiter: Arc::new(limiter),
            store,
            clock,
        }
    }
}

impl Default for TestLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Skip test if environment variable is not set
#[macro_export]
macro_rules! skip_without_env {
    ($var:expr) => {
        if std::env::var($var).is_err() {
            eprintln!("Skipping test: {} environment variable not set", $var);
            return;
        }
    };
}

/// Assert that a result is Ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}
