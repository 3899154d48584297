//! Error types for notes-dl
//!
//! The taxonomy follows the needs of a long-running, rate-limited scrape:
//! - transport faults and malformed vendor envelopes are transient and worth
//!   retrying (anti-bot throttling tends to produce both)
//! - everything else is a definitive failure, surfaced immediately

use thiserror::Error;

/// Result type alias for notes-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for notes-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_name")
        key: Option<String>,
    },

    /// Network error (connect failures, timeouts, bad responses)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The vendor envelope reported failure (success flag false)
    #[error("vendor API reported failure: {0}")]
    ApiFailure(String),

    /// The vendor envelope is missing its data container
    #[error("vendor response missing data container")]
    MissingData,

    /// The vendor envelope's items array is missing or empty
    #[error("vendor response items array missing or empty")]
    EmptyItems,

    /// A fetched record had an unexpected shape
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// A note or user URL could not be parsed into a reference
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The URL that failed to parse
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// Retry budget exhausted; wraps the last retryable fault seen
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Total attempts made (initial call included)
        attempts: u32,
        /// The final retryable error
        #[source]
        last: Box<Error>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Spreadsheet write error
    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] csv::Error),
}

impl Error {
    /// Shorthand for a configuration error with an associated key
    pub(crate) fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}
