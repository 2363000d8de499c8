//! Configuration management
//!
//! This module handles loading, validation, and management of the limiter
//! configuration, either from a YAML file or from environment variables.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::utils::error::{LimiterError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Rate limiter behaviour
    #[serde(default)]
    pub limiter: RateLimiterConfig,
    /// Shared store connection
    #[serde(default)]
    pub redis: RedisConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LimiterError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| LimiterError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from environment variables (and a `.env` file if present)
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        let redis = &mut config.redis;
        if let Some(url) = env_var::<String>("REDIS_URL")? {
            redis.url = url;
        }
        if let Some(enabled) = env_var("REDIS_ENABLED")? {
            redis.enabled = enabled;
        }
        if let Some(ms) = env_var("REDIS_CONNECTION_TIMEOUT_MS")? {
            redis.connection_timeout_ms = ms;
        }
        if let Some(ms) = env_var("REDIS_RESPONSE_TIMEOUT_MS")? {
            redis.response_timeout_ms = ms;
        }
        if let Some(retries) = env_var("REDIS_MAX_RETRIES")? {
            redis.max_retries = retries;
        }

        let limiter = &mut config.limiter;
        if let Some(prefix) = env_var::<String>("RATE_LIMIT_KEY_PREFIX")? {
            limiter.key_prefix = prefix;
        }
        if let Some(algorithm) = env_var("RATE_LIMIT_DEFAULT_ALGORITHM")? {
            limiter.default_algorithm = algorithm;
        }
        if let Some(limit) = env_var("RATE_LIMIT_FALLBACK_LIMIT")? {
            limiter.fallback.limit = limit;
        }
        if let Some(ms) = env_var("RATE_LIMIT_FALLBACK_WINDOW_MS")? {
            limiter.fallback.window_ms = ms;
        }
        if let Some(ms) = env_var("RATE_LIMIT_VIOLATION_WINDOW_MS")? {
            limiter.violations.window_ms = ms;
        }
        if let Some(max) = env_var("RATE_LIMIT_MAX_VIOLATIONS")? {
            limiter.violations.max_violations_before_ban = max;
        }
        if let Some(ms) = env_var("RATE_LIMIT_BAN_DURATION_MS")? {
            limiter.violations.ban_duration_ms = ms;
        }
        if let Some(allow) = env_var("RATE_LIMIT_ALLOW_ON_STORE_FAILURE")? {
            limiter.allow_on_store_failure = allow;
        }
        if let Some(log) = env_var("RATE_LIMIT_LOG_STORE_ERRORS")? {
            limiter.log_store_errors = log;
        }
        if let Some(ms) = env_var("RATE_LIMIT_OPERATION_TIMEOUT_MS")? {
            limiter.operation_timeout_ms = ms;
        }

        config.validate()?;
        Ok(config)
    }

    /// Get limiter configuration
    pub fn limiter(&self) -> &RateLimiterConfig {
        &self.limiter
    }

    /// Get redis configuration
    pub fn redis(&self) -> &RedisConfig {
        &self.redis
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.limiter
            .validate()
            .map_err(|e| LimiterError::Config(format!("Limiter config error: {}", e)))?;

        self.redis
            .validate()
            .map_err(|e| LimiterError::Config(format!("Redis config error: {}", e)))?;

        debug!("Configuration validation completed");
        Ok(())
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        self.limiter = self.limiter.merge(other.limiter);
        self.redis = self.redis.merge(other.redis);
        self
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| LimiterError::Config(format!("Failed to serialize config to YAML: {}", e)))
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LimiterError::Config(format!("Failed to serialize config to JSON: {}", e)))
    }
}

/// Read and parse an environment variable; unset or empty means `None`.
fn env_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| LimiterError::Config(format!("Invalid value for {}: {}", name, e))),
        _ => Ok(None),
    }
}
