//! Rate limiter configuration validators

use super::trait_def::Validate;
use crate::config::models::*;

impl Validate for RateLimiterConfig {
    fn validate(&self) -> Result<(), String> {
        if self.key_prefix.contains(&['*', '?', '[', ']'][..]) {
            return Err("Key prefix must not contain glob characters (* ? [ ])".to_string());
        }

        if self.operation_timeout_ms == 0 {
            return Err("Operation timeout must be greater than 0".to_string());
        }

        self.fallback.validate()?;
        self.violations.validate()?;

        Ok(())
    }
}

impl Validate for FallbackConfig {
    fn validate(&self) -> Result<(), String> {
        if self.window_ms == 0 {
            return Err("Fallback window must be greater than 0".to_string());
        }

        if !(0.0..=1.0).contains(&self.sweep_probability) {
            return Err("Fallback sweep probability must be between 0 and 1".to_string());
        }

        Ok(())
    }
}

impl Validate for ViolationConfig {
    fn validate(&self) -> Result<(), String> {
        if self.window_ms == 0 {
            return Err("Violation window must be greater than 0".to_string());
        }

        if self.max_violations_before_ban == 0 {
            return Err("Max violations before ban must be greater than 0".to_string());
        }

        if self.ban_duration_ms == 0 {
            return Err("Ban duration must be greater than 0".to_string());
        }

        if self.max_records < self.max_violations_before_ban as usize {
            return Err(format!(
                "Max violation records ({}) must be at least max violations before ban ({})",
                self.max_records, self.max_violations_before_ban
            ));
        }

        Ok(())
    }
}
