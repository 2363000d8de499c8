//! Shared store configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis URL
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Enable Redis (if false, the in-memory store is used)
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Connection timeout in milliseconds
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
    /// Response timeout in milliseconds
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
    /// Reconnect attempts per failed command before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Interval between health probes in milliseconds
    #[serde(default = "default_health_check_interval_ms")]
    pub health_check_interval_ms: u64,
    /// Upper bound on the reconnect backoff in milliseconds
    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            enabled: true,
            connection_timeout_ms: default_connection_timeout_ms(),
            response_timeout_ms: default_response_timeout_ms(),
            max_retries: default_max_retries(),
            health_check_interval_ms: default_health_check_interval_ms(),
            max_reconnect_delay_ms: default_max_reconnect_delay_ms(),
        }
    }
}

impl RedisConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }

    pub fn max_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.max_reconnect_delay_ms)
    }

    /// Merge Redis configurations; `enabled` always comes from other
    pub fn merge(mut self, other: Self) -> Self {
        if !other.url.is_empty() && other.url != default_redis_url() {
            self.url = other.url;
        }
        self.enabled = other.enabled;
        if other.connection_timeout_ms != default_connection_timeout_ms() {
            self.connection_timeout_ms = other.connection_timeout_ms;
        }
        if other.response_timeout_ms != default_response_timeout_ms() {
            self.response_timeout_ms = other.response_timeout_ms;
        }
        if other.max_retries != default_max_retries() {
            self.max_retries = other.max_retries;
        }
        if other.health_check_interval_ms != default_health_check_interval_ms() {
            self.health_check_interval_ms = other.health_check_interval_ms;
        }
        if other.max_reconnect_delay_ms != default_max_reconnect_delay_ms() {
            self.max_reconnect_delay_ms = other.max_reconnect_delay_ms;
        }
        self
    }
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_connection_timeout_ms() -> u64 {
    2_000
}

fn default_response_timeout_ms() -> u64 {
    1_000
}

fn default_max_retries() -> usize {
    3
}

fn default_health_check_interval_ms() -> u64 {
    5_000
}

fn default_max_reconnect_delay_ms() -> u64 {
    30_000
}
