//! Error types for the parity core.
//!
//! Missing quote fields are never errors; they flow through the math as
//! `None`. Only structural problems with a row or its market context end up
//! here.

use thiserror::Error;

/// Errors raised while validating parity inputs.
#[derive(Debug, Error, PartialEq)]
pub enum ParityError {
    /// Strike is missing, non-finite, or not strictly positive.
    #[error("invalid strike: {0}")]
    InvalidStrike(String),

    /// A market context field is out of range.
    #[error("invalid market context: {field} = {value} ({reason})")]
    InvalidContext {
        /// Name of the offending field.
        field: &'static str,
        /// Value that was rejected.
        value: f64,
        /// Constraint the value violated.
        reason: &'static str,
    },

    /// Configuration values are inconsistent.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ParityError {
    /// Creates an invalid context error.
    pub fn invalid_context(field: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidContext {
            field,
            value,
            reason,
        }
    }
}

/// Result alias for parity core operations.
pub type Result<T> = std::result::Result<T, ParityError>;
