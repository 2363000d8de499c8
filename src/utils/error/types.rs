//! Error types for the rate limiter

use thiserror::Error;

/// Result type alias for the rate limiter
pub type Result<T> = std::result::Result<T, LimiterError>;

/// Main error type for the rate limiter
///
/// A rate-limit denial is never an error. These variants describe
/// configuration problems, caller mistakes and store outages.
#[derive(Error, Debug)]
pub enum LimiterError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid call arguments, rejected before the store is touched
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Redis errors
    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Store failure surfaced to the caller (fail-closed mode)
    #[error("Store error during {operation} for '{identifier}': {message}")]
    Store {
        operation: String,
        identifier: String,
        message: String,
    },

    /// Store call exceeded its deadline
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Store unreachable
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
