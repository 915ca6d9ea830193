//! Error types for market data retrieval and storage.

use thiserror::Error;

/// Errors from the quote source or the CSV layer.
#[derive(Debug, Error)]
pub enum DataError {
    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// API request failed.
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Response body or error message.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimit {
        /// Seconds to wait before retry.
        retry_after_secs: u64,
    },

    /// Ticker failed validation.
    #[error("invalid ticker: {0}")]
    InvalidTicker(String),

    /// No usable price history for the underlying.
    #[error("no price history for {ticker}")]
    NoPriceHistory {
        /// Underlying ticker.
        ticker: String,
    },

    /// Option chain response was empty.
    #[error("no options data for {ticker}")]
    NoOptionsData {
        /// Underlying ticker.
        ticker: String,
    },

    /// CSV read/write failure.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl DataError {
    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a rate limit error.
    pub fn rate_limit(retry_after_secs: u64) -> Self {
        Self::RateLimit { retry_after_secs }
    }

    /// Creates a no-price-history error.
    pub fn no_price_history(ticker: impl Into<String>) -> Self {
        Self::NoPriceHistory {
            ticker: ticker.into(),
        }
    }

    /// Creates a no-options-data error.
    pub fn no_options_data(ticker: impl Into<String>) -> Self {
        Self::NoOptionsData {
            ticker: ticker.into(),
        }
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Serialization(err.to_string())
        } else if let Some(status) = err.status() {
            Self::api(status.as_u16(), err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;
