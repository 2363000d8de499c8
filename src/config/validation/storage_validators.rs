//! Storage configuration validators

use super::trait_def::Validate;
use crate::config::models::*;
use tracing::debug;

impl Validate for RedisConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating redis configuration");

        if !self.enabled {
            return Ok(());
        }

        if self.url.is_empty() {
            return Err("Redis URL cannot be empty".to_string());
        }

        if !self.url.starts_with("redis://")
            && !self.url.starts_with("rediss://")
            && !self.url.starts_with("redis+unix://")
            && !self.url.starts_with("unix://")
        {
            return Err("Redis URL must start with redis://, rediss:// or unix://".to_string());
        }

        if url::Url::parse(&self.url).is_err() {
            return Err("Redis URL is not a valid URL".to_string());
        }

        if self.connection_timeout_ms == 0 || self.response_timeout_ms == 0 {
            return Err("Redis timeouts must be greater than 0".to_string());
        }

        if self.health_check_interval_ms == 0 {
            return Err("Redis health check interval must be greater than 0".to_string());
        }

        Ok(())
    }
}
