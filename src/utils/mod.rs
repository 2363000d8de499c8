//! Utility modules for the rate limiter
//!
//! ## Module Organization
//!
//! - **clock**: Millisecond wall clock abstraction (system and manual)
//! - **error**: Error types and helpers
//! - **logging**: Tracing subscriber setup

pub mod clock;
pub mod error;
pub mod logging;

pub use clock::{Clock, ManualClock, SystemClock};

/// Format duration as human readable string
pub fn format_duration(duration_ms: u64) -> String {
    if duration_ms < 1000 {
        format!("{}ms", duration_ms)
    } else if duration_ms < 60_000 {
        format!("{:.1}s", duration_ms as f64 / 1000.0)
    } else if duration_ms < 3_600_000 {
        format!("{:.1}m", duration_ms as f64 / 60_000.0)
    } else {
        format!("{:.1}h", duration_ms as f64 / 3_600_000.0)
    }
}

/// Milliseconds rounded up to whole seconds
pub fn ceil_secs(ms: u64) -> u64 {
    ms.div_ceil(1000)
}
