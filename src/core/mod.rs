//! Core rate limiting functionality
//!
//! - **rate_limiter**: the `RateLimiter` facade, algorithm engines, the
//!   in-process fallback and violation/ban tracking

pub mod rate_limiter;
