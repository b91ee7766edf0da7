//! Error types for data operations.

use std::time::Duration;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// The origin answered with a status that is neither 2xx nor an expected 304
    #[error("Origin rejected request for {url}: HTTP {status_code}")]
    OriginRejected {
        /// Requested URL
        url: String,
        /// Status code returned by the origin
        status_code: u16,
    },

    /// Connection, timeout or DNS failure that persisted through every retry
    #[error("Transport failure for {url} after {attempts} attempt(s): {message}")]
    Transport {
        /// Requested URL
        url: String,
        /// Number of attempts made, including the first
        attempts: u32,
        /// Last transport error message
        message: String,
    },

    /// Waiting for a rate limiter slot would exceed the configured bound
    #[error("Rate limit exceeded: waited {waited:?}, bound is {max_delay:?}")]
    RateLimitExceeded {
        /// Time already spent waiting
        waited: Duration,
        /// Configured maximum wait
        max_delay: Duration,
    },

    /// Attempted to cache an envelope without a freshness token
    #[error("Refusing to cache {0}: response has no Last-Modified token")]
    Uncacheable(String),

    /// Network client error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Invalid date range
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date of the range
        start: String,
        /// End date of the range
        end: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid symbol
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// CIK not found for ticker
    #[error("CIK not found for ticker: {0}")]
    CikNotFound(String),

    /// URL could not be parsed or mapped to a cache path
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DataError {
    /// Whether retrying the same call later could plausibly succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::RateLimitExceeded { .. })
    }

    /// The origin status code, if this error carries one.
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::OriginRejected { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

impl From<figment::Error> for DataError {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<url::ParseError> for DataError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}
