//! Integration tests for redlimit
//!
//! These tests drive the public `RateLimiter` API over the in-memory store
//! and verify observable behaviour without mocking.

pub mod concurrency_tests;
pub mod fallback_tests;
pub mod fixed_window_tests;
pub mod reset_tests;
pub mod sliding_window_tests;
pub mod token_bucket_tests;
pub mod violation_tests;
