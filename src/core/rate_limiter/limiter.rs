//! Core RateLimiter implementation
//!
//! This module contains the RateLimiter facade, its builder and the routing
//! between the shared store and the fallback limiter.

use super::fallback::FallbackLimiter;
use super::keys::KeyBuilder;
use super::types::{RateLimitOptions, RateLimitResult, UsageStats};
use crate::config::{Config, RateLimiterConfig, Validate};
use crate::storage::{CounterStore, MemoryStore};
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::error::{LimiterError, Result};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Whether a store call only reads state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Access {
    Read,
    Write,
}

/// Distributed rate limiter
///
/// Cheap to share: wrap it in an `Arc` and hand it to every request handler.
pub struct RateLimiter {
    pub(super) store: Arc<dyn CounterStore>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) config: RateLimiterConfig,
    pub(super) keys: KeyBuilder,
    pub(super) fallback: FallbackLimiter,
    /// Last connectivity seen, so transitions are logged once
    store_reachable: AtomicBool,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .field("store_connected", &self.store.is_connected())
            .field("fallback", self.fallback.config())
            .field("fallback_size", &self.fallback.len())
            .finish()
    }
}

impl RateLimiter {
    /// Create a limiter over `store` using the system clock
    pub fn new(store: Arc<dyn CounterStore>, config: RateLimiterConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    fn with_clock(
        store: Arc<dyn CounterStore>,
        config: RateLimiterConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            keys: KeyBuilder::new(config.key_prefix.clone()),
            fallback: FallbackLimiter::new(config.fallback.clone()),
            store,
            clock,
            config,
            store_reachable: AtomicBool::new(true),
        }
    }

    pub fn builder() -> RateLimiterBuilder {
        RateLimiterBuilder::new()
    }

    /// Build a limiter from a full configuration: Redis when enabled,
    /// otherwise the in-memory store.
    pub async fn connect(config: &Config) -> Result<Self> {
        config.validate()?;

        let store: Arc<dyn CounterStore> = if config.redis.enabled {
            redis_store(config).await?
        } else {
            info!("Redis disabled; using the in-memory store");
            Arc::new(MemoryStore::new())
        };

        Ok(Self::new(store, config.limiter.clone()))
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    pub fn is_store_connected(&self) -> bool {
        self.store.is_connected()
    }

    /// Identifiers currently tracked by the fallback limiter
    pub fn fallback_size(&self) -> usize {
        self.fallback.len()
    }

    /// Count one request and decide whether it may proceed
    pub async fn check_limit(&self, options: &RateLimitOptions) -> Result<RateLimitResult> {
        options.validate()?;

        let now = self.clock.now_ms();
        if options.is_unlimited() {
            return Ok(RateLimitResult::unlimited(now, options.window_ms));
        }

        let identifier = options.identifier.as_str();
        let algorithm = options.algorithm.unwrap_or(self.config.default_algorithm);

        if !self.observe_store() {
            return Ok(self.fallback.check(identifier, now));
        }

        let check = algorithm
            .engine()
            .check(self.store.as_ref(), &self.keys, options, now);

        let result = match tokio::time::timeout(self.config.operation_timeout(), check).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                self.store_failure("check_limit", identifier, e)?;
                self.fallback.check(identifier, now)
            }
            Err(_) => {
                warn!(
                    identifier,
                    algorithm = %algorithm,
                    "Store did not answer within {}ms; using the fallback limiter",
                    self.config.operation_timeout_ms
                );
                self.fallback.check(identifier, now)
            }
        };

        debug!(
            identifier,
            algorithm = %algorithm,
            allowed = result.allowed,
            remaining = result.remaining,
            source = ?result.source,
            "Rate limit decision"
        );
        Ok(result)
    }

    /// Clear every counter for `identifier`: sliding window, token bucket,
    /// all fixed-window shards and the fallback bucket.
    pub async fn reset(&self, identifier: &str) -> Result<()> {
        validate_identifier(identifier)?;
        self.fallback.remove(identifier);

        self.run_store_op("reset", identifier, Access::Write, (), async {
            let mut keys: Vec<String> = self
                .store
                .keys_matching(&self.keys.fixed_pattern(identifier))
                .await?
                .into_iter()
                .filter(|key| self.keys.is_fixed_shard(identifier, key))
                .collect();
            keys.push(self.keys.sliding(identifier));
            keys.push(self.keys.bucket(identifier));
            self.store.delete(&keys).await?;
            info!(identifier, shards = keys.len() - 2, "Rate limit state reset");
            Ok(())
        })
        .await
    }

    /// Sliding-window entries for `identifier` in the trailing hour and day
    pub async fn get_usage_stats(&self, identifier: &str) -> Result<UsageStats> {
        validate_identifier(identifier)?;
        let now = self.clock.now_ms();
        let key = self.keys.sliding(identifier);

        self.run_store_op(
            "get_usage_stats",
            identifier,
            Access::Read,
            UsageStats::default(),
            async {
                let hourly = self
                    .store
                    .sorted_set_count(&key, (now - HOUR_MS) as f64, now as f64)
                    .await?;
                let daily = self
                    .store
                    .sorted_set_count(&key, (now - DAY_MS) as f64, now as f64)
                    .await?;
                Ok(UsageStats { hourly, daily })
            },
        )
        .await
    }

    /// Check the cached connectivity flag, logging each change once
    fn observe_store(&self) -> bool {
        let connected = self.store.is_connected();
        let previous = self.store_reachable.swap(connected, Ordering::SeqCst);
        if previous != connected {
            if connected {
                info!("Counter store reachable again; leaving fallback mode");
            } else {
                warn!("Counter store unreachable; answering from the fallback limiter");
            }
        }
        connected
    }

    /// Apply the fail-open / fail-closed switch to a store error
    pub(super) fn store_failure(
        &self,
        operation: &str,
        identifier: &str,
        error: LimiterError,
    ) -> Result<()> {
        if self.config.allow_on_store_failure {
            if self.config.log_store_errors {
                warn!(operation, identifier, "Store error, failing open: {}", error);
            }
            Ok(())
        } else {
            if self.config.log_store_errors {
                error!(operation, identifier, "Store error: {}", error);
            }
            Err(LimiterError::store(operation, identifier, &error))
        }
    }

    /// Run a non-check store call with the degraded-mode rules: skipped
    /// while disconnected, bounded by the operation timeout, and subject to
    /// the failure switch. `neutral` is the answer whenever the store is not
    /// consulted.
    pub(super) async fn run_store_op<T, F>(
        &self,
        operation: &str,
        identifier: &str,
        access: Access,
        neutral: T,
        call: F,
    ) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if !self.observe_store() {
            match access {
                Access::Read => debug!(operation, identifier, "Store unreachable; neutral answer"),
                Access::Write => warn!(operation, identifier, "Store unreachable; skipping write"),
            }
            return Ok(neutral);
        }

        let error = match tokio::time::timeout(self.config.operation_timeout(), call).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e,
            Err(_) => LimiterError::timeout(format!(
                "{} did not finish within {}ms",
                operation, self.config.operation_timeout_ms
            )),
        };

        self.store_failure(operation, identifier, error)?;
        Ok(neutral)
    }
}

#[cfg(feature = "redis")]
async fn redis_store(config: &Config) -> Result<Arc<dyn CounterStore>> {
    let store = crate::storage::redis::RedisStore::connect(&config.redis).await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "redis"))]
async fn redis_store(_config: &Config) -> Result<Arc<dyn CounterStore>> {
    Err(LimiterError::config(
        "redis.enabled is set but this build has no Redis support",
    ))
}

pub(super) fn validate_identifier(identifier: &str) -> Result<()> {
    if identifier.is_empty() {
        return Err(LimiterError::invalid_input("identifier must not be empty"));
    }
    Ok(())
}

/// Builder for [`RateLimiter`]
#[derive(Default)]
pub struct RateLimiterBuilder {
    store: Option<Arc<dyn CounterStore>>,
    clock: Option<Arc<dyn Clock>>,
    config: RateLimiterConfig,
}

impl RateLimiterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn CounterStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn config(mut self, config: RateLimiterConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the configuration and build. Without an explicit store, an
    /// in-memory store sharing the limiter's clock is used.
    pub fn build(self) -> Result<RateLimiter> {
        self.config
            .validate()
            .map_err(|e| LimiterError::config(format!("Limiter config error: {}", e)))?;

        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let store: Arc<dyn CounterStore> = match self.store {
            Some(store) => store,
            None => Arc::new(MemoryStore::with_clock(clock.clone())),
        };

        Ok(RateLimiter::with_clock(store, self.config, clock))
    }
}
