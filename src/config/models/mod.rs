//! Configuration data models
//!
//! This module defines the configuration structures used throughout the crate.

#![allow(missing_docs)]

pub mod rate_limit;
pub mod storage;

// Re-export all configuration types
pub use rate_limit::*;
pub use storage::*;

/// Default key prefix for every store key
pub fn default_key_prefix() -> String {
    "ratelimit:".to_string()
}

/// Default fallback ceiling per window
pub fn default_fallback_limit() -> u32 {
    100
}

/// Default fallback window (1 minute)
pub fn default_fallback_window_ms() -> u64 {
    60_000
}

/// Probability that a fallback check sweeps expired buckets
pub fn default_sweep_probability() -> f64 {
    0.01
}

/// Default violation window (1 hour)
pub fn default_violation_window_ms() -> u64 {
    3_600_000
}

pub fn default_max_violations_before_ban() -> u32 {
    10
}

/// Default ban duration (1 hour)
pub fn default_ban_duration_ms() -> u64 {
    3_600_000
}

pub fn default_max_violation_records() -> usize {
    1000
}

/// Default deadline for a single store operation
pub fn default_operation_timeout_ms() -> u64 {
    1000
}

pub(crate) fn default_true() -> bool {
    true
}
