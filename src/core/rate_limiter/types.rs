//! Rate limiting types and data structures

use crate::utils::error::{LimiterError, Result};
use serde::{Deserialize, Serialize};

pub use crate::config::Algorithm;

/// `limit` value meaning "no limit"
pub const UNLIMITED: i64 = -1;

/// Violation records returned when the caller does not ask for a count
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// One rate limit check
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitOptions {
    /// Opaque key the quota belongs to
    pub identifier: String,
    /// Requests per window, or [`UNLIMITED`]
    pub limit: i64,
    /// Window length in milliseconds
    pub window_ms: u64,
    /// Engine to use; `None` means the configured default
    pub algorithm: Option<Algorithm>,
    /// Capacity multiplier for sliding window and token bucket
    pub burst_multiplier: f64,
}

impl RateLimitOptions {
    pub fn new(identifier: impl Into<String>, limit: i64, window_ms: u64) -> Self {
        Self {
            identifier: identifier.into(),
            limit,
            window_ms,
            algorithm: None,
            burst_multiplier: 1.0,
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn with_burst_multiplier(mut self, burst_multiplier: f64) -> Self {
        self.burst_multiplier = burst_multiplier;
        self
    }

    pub fn is_unlimited(&self) -> bool {
        self.limit == UNLIMITED
    }

    /// `floor(limit * burst_multiplier)`
    pub fn burst_limit(&self) -> i64 {
        (self.limit as f64 * self.burst_multiplier).floor() as i64
    }

    /// Reject arguments no store call should ever see
    pub fn validate(&self) -> Result<()> {
        if self.identifier.is_empty() {
            return Err(LimiterError::invalid_input("identifier must not be empty"));
        }
        if self.limit < UNLIMITED {
            return Err(LimiterError::invalid_input(format!(
                "limit must be -1 (unlimited) or non-negative, got {}",
                self.limit
            )));
        }
        if self.is_unlimited() {
            return Ok(());
        }
        if self.window_ms == 0 {
            return Err(LimiterError::invalid_input("window_ms must be greater than 0"));
        }
        if !self.burst_multiplier.is_finite() || self.burst_multiplier <= 0.0 {
            return Err(LimiterError::invalid_input(format!(
                "burst_multiplier must be a positive number, got {}",
                self.burst_multiplier
            )));
        }
        Ok(())
    }
}

/// Who produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionSource {
    /// The shared counter store
    Store,
    /// The in-process fallback, while the store was unreachable or failing
    Fallback,
    /// The unlimited sentinel; nothing was consulted
    Unlimited,
}

/// Rate limit check result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Ceiling the decision was made against
    pub limit: i64,
    pub remaining: i64,
    /// When the quota is fully available again, ms since the epoch
    pub reset_at: i64,
    /// Seconds to wait; set exactly when the request was denied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    pub source: DecisionSource,
}

impl RateLimitResult {
    pub(crate) fn unlimited(now_ms: i64, window_ms: u64) -> Self {
        Self {
            allowed: true,
            limit: UNLIMITED,
            remaining: UNLIMITED,
            reset_at: now_ms + window_ms as i64,
            retry_after: None,
            source: DecisionSource::Unlimited,
        }
    }

    /// Standard rate limit response headers as name/value pairs.
    /// Unlimited results produce none.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        if self.source == DecisionSource::Unlimited {
            return Vec::new();
        }

        let mut headers = vec![
            ("X-RateLimit-Limit", self.limit.to_string()),
            ("X-RateLimit-Remaining", self.remaining.to_string()),
            (
                "X-RateLimit-Reset",
                (self.reset_at.max(0) as u64).div_ceil(1000).to_string(),
            ),
        ];
        if let Some(retry_after) = self.retry_after {
            headers.push(("Retry-After", retry_after.to_string()));
        }
        headers
    }
}

/// A denied request worth remembering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationRecord {
    /// When it happened, ms since the epoch
    pub timestamp: i64,
    pub identifier: String,
    pub endpoint: String,
    /// Limit that was exceeded
    pub limit: i64,
    /// Requests attempted in the window
    pub attempted: u64,
}

impl ViolationRecord {
    pub fn new(
        identifier: impl Into<String>,
        endpoint: impl Into<String>,
        limit: i64,
        attempted: u64,
        timestamp: i64,
    ) -> Self {
        Self {
            timestamp,
            identifier: identifier.into(),
            endpoint: endpoint.into(),
            limit,
            attempted,
        }
    }
}

/// Ban state for one identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BanStatus {
    pub banned: bool,
    /// Ban expiry, ms since the epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<i64>,
}

impl BanStatus {
    pub fn not_banned() -> Self {
        Self::default()
    }
}

/// Sliding-window entries in the trailing hour and day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsageStats {
    pub hourly: u64,
    pub daily: u64,
}
