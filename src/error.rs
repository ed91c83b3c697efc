//! Error types for WindowGuard.

use std::time::Duration;

use thiserror::Error;

/// Main error type for WindowGuard operations.
#[derive(Error, Debug)]
pub enum LimiterError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The store could not be reached while constructing a client
    #[error("Connection error: {0}")]
    Connect(String),

    /// Errors reported by the shared store
    #[error("Store error: {0}")]
    Store(#[from] redis::RedisError),

    /// No pooled connection could be checked out
    #[error("Pool error: {0}")]
    Pool(String),

    /// A store round trip exceeded its budget
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// The limit supplied with a decision was zero or negative
    #[error("Invalid limit {0}: limit must be a positive integer")]
    InvalidLimit(i64),

    /// The identity supplied with a decision was empty
    #[error("Identity must not be empty")]
    EmptyIdentity,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LimiterError {
    /// Whether this error reports caller misuse rather than an infrastructure failure.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, LimiterError::InvalidLimit(_) | LimiterError::EmptyIdentity)
    }
}

impl From<deadpool_redis::PoolError> for LimiterError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        LimiterError::Pool(err.to_string())
    }
}

impl From<::config::ConfigError> for LimiterError {
    fn from(err: ::config::ConfigError) -> Self {
        LimiterError::Config(err.to_string())
    }
}

/// Result type alias for WindowGuard operations.
pub type Result<T> = std::result::Result<T, LimiterError>;
