//! Helper functions for creating and classifying errors

use super::types::LimiterError;

impl LimiterError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn store<O, I>(operation: O, identifier: I, source: &LimiterError) -> Self
    where
        O: Into<String>,
        I: Into<String>,
    {
        Self::Store {
            operation: operation.into(),
            identifier: identifier.into(),
            message: source.to_string(),
        }
    }

    /// Whether the error means the store connection itself is gone,
    /// as opposed to a failed command on a live connection.
    pub fn is_connection_error(&self) -> bool {
        match self {
            #[cfg(feature = "redis")]
            Self::Redis(e) => {
                e.is_io_error()
                    || e.is_connection_dropped()
                    || e.is_connection_refusal()
                    || e.is_timeout()
            }
            Self::Timeout(_) | Self::Unavailable(_) => true,
            _ => false,
        }
    }

    /// Whether the caller passed bad arguments
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
