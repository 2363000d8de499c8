//! In-process fallback limiter
//!
//! Answers checks while the shared store is unreachable. It ignores the
//! caller's limit and applies the configured fallback ceiling, so an outage
//! never makes the service more permissive than that ceiling allows.

use super::types::{DecisionSource, RateLimitResult};
use crate::config::FallbackConfig;
use crate::utils::ceil_secs;
use dashmap::DashMap;
use rand::Rng;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct FallbackBucket {
    count: u64,
    reset_at: i64,
}

/// Per-process fixed-window counters keyed by identifier
#[derive(Debug)]
pub struct FallbackLimiter {
    buckets: DashMap<String, FallbackBucket>,
    config: FallbackConfig,
}

impl FallbackLimiter {
    pub fn new(config: FallbackConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &FallbackConfig {
        &self.config
    }

    /// Count one request for `identifier` at `now_ms`
    pub fn check(&self, identifier: &str, now_ms: i64) -> RateLimitResult {
        if self.should_sweep() {
            self.sweep(now_ms);
        }

        let limit = u64::from(self.config.limit);
        let bucket = {
            let mut entry = self
                .buckets
                .entry(identifier.to_string())
                .or_insert(FallbackBucket {
                    count: 0,
                    reset_at: now_ms + self.config.window_ms as i64,
                });
            if entry.reset_at < now_ms {
                *entry = FallbackBucket {
                    count: 0,
                    reset_at: now_ms + self.config.window_ms as i64,
                };
            }
            entry.count += 1;
            *entry
        };

        let allowed = bucket.count <= limit;
        let retry_after =
            (!allowed).then(|| ceil_secs((bucket.reset_at - now_ms).max(0) as u64).max(1));

        RateLimitResult {
            allowed,
            limit: limit as i64,
            remaining: limit.saturating_sub(bucket.count) as i64,
            reset_at: bucket.reset_at,
            retry_after,
            source: DecisionSource::Fallback,
        }
    }

    /// Evict buckets whose window has ended
    pub fn sweep(&self, now_ms: i64) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| bucket.reset_at >= now_ms);
        let evicted = before.saturating_sub(self.buckets.len());
        if evicted > 0 {
            debug!(evicted, "Swept expired fallback buckets");
        }
        evicted
    }

    pub fn remove(&self, identifier: &str) {
        self.buckets.remove(identifier);
    }

    pub fn clear(&self) {
        self.buckets.clear();
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    fn should_sweep(&self) -> bool {
        let p = self.config.sweep_probability;
        p > 0.0 && rand::thread_rng().gen_bool(p.min(1.0))
    }
}
