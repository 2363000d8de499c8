//! Rate limiting configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Rate limiter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Prefix prepended to every store key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Algorithm used when a check does not name one
    #[serde(default)]
    pub default_algorithm: Algorithm,
    /// In-process limiter used while the store is unreachable
    #[serde(default)]
    pub fallback: FallbackConfig,
    /// Violation tracking and ban escalation
    #[serde(default)]
    pub violations: ViolationConfig,
    /// On store errors, answer from the fallback (`true`, fail-open) or
    /// return the error to the caller (`false`, fail-closed)
    #[serde(default = "default_true")]
    pub allow_on_store_failure: bool,
    /// Log store errors with operation and identifier context
    #[serde(default = "default_true")]
    pub log_store_errors: bool,
    /// Deadline for one store round trip, in milliseconds
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            default_algorithm: Algorithm::default(),
            fallback: FallbackConfig::default(),
            violations: ViolationConfig::default(),
            allow_on_store_failure: true,
            log_store_errors: true,
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

impl RateLimiterConfig {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    /// Merge rate limiter configurations. Other takes precedence where it
    /// differs from the defaults; switches always come from other.
    pub fn merge(mut self, other: Self) -> Self {
        if other.key_prefix != default_key_prefix() {
            self.key_prefix = other.key_prefix;
        }
        if other.default_algorithm != Algorithm::default() {
            self.default_algorithm = other.default_algorithm;
        }
        self.fallback = self.fallback.merge(other.fallback);
        self.violations = self.violations.merge(other.violations);
        self.allow_on_store_failure = other.allow_on_store_failure;
        self.log_store_errors = other.log_store_errors;
        if other.operation_timeout_ms != default_operation_timeout_ms() {
            self.operation_timeout_ms = other.operation_timeout_ms;
        }
        self
    }
}

/// Fallback limiter configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FallbackConfig {
    /// Requests allowed per fallback window, regardless of the caller's limit
    #[serde(default = "default_fallback_limit")]
    pub limit: u32,
    /// Fallback window length in milliseconds
    #[serde(default = "default_fallback_window_ms")]
    pub window_ms: u64,
    /// Probability that a check also evicts expired buckets
    #[serde(default = "default_sweep_probability")]
    pub sweep_probability: f64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            limit: default_fallback_limit(),
            window_ms: default_fallback_window_ms(),
            sweep_probability: default_sweep_probability(),
        }
    }
}

impl FallbackConfig {
    pub fn merge(mut self, other: Self) -> Self {
        if other.limit != default_fallback_limit() {
            self.limit = other.limit;
        }
        if other.window_ms != default_fallback_window_ms() {
            self.window_ms = other.window_ms;
        }
        if other.sweep_probability != default_sweep_probability() {
            self.sweep_probability = other.sweep_probability;
        }
        self
    }
}

/// Violation and ban configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViolationConfig {
    /// Violations older than this no longer count toward a ban
    #[serde(default = "default_violation_window_ms")]
    pub window_ms: u64,
    /// Recent violations that trigger a ban
    #[serde(default = "default_max_violations_before_ban")]
    pub max_violations_before_ban: u32,
    /// Length of an automatic ban
    #[serde(default = "default_ban_duration_ms")]
    pub ban_duration_ms: u64,
    /// Upper bound on stored violation records per identifier
    #[serde(default = "default_max_violation_records")]
    pub max_records: usize,
}

impl Default for ViolationConfig {
    fn default() -> Self {
        Self {
            window_ms: default_violation_window_ms(),
            max_violations_before_ban: default_max_violations_before_ban(),
            ban_duration_ms: default_ban_duration_ms(),
            max_records: default_max_violation_records(),
        }
    }
}

impl ViolationConfig {
    pub fn merge(mut self, other: Self) -> Self {
        if other.window_ms != default_violation_window_ms() {
            self.window_ms = other.window_ms;
        }
        if other.max_violations_before_ban != default_max_violations_before_ban() {
            self.max_violations_before_ban = other.max_violations_before_ban;
        }
        if other.ban_duration_ms != default_ban_duration_ms() {
            self.ban_duration_ms = other.ban_duration_ms;
        }
        if other.max_records != default_max_violation_records() {
            self.max_records = other.max_records;
        }
        self
    }
}

/// Rate limiting algorithm
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Timestamped entries in a moving window
    #[default]
    SlidingWindow,
    /// Continuously refilled bucket with burst capacity
    TokenBucket,
    /// Counters reset at quantized window boundaries
    FixedWindow,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SlidingWindow => "sliding-window",
            Self::TokenBucket => "token-bucket",
            Self::FixedWindow => "fixed-window",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "sliding-window" | "sliding" => Ok(Self::SlidingWindow),
            "token-bucket" | "bucket" => Ok(Self::TokenBucket),
            "fixed-window" | "fixed" => Ok(Self::FixedWindow),
            other => Err(format!("unknown rate limit algorithm '{}'", other)),
        }
    }
}
