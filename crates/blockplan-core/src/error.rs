//! Core error types for blockplan-core.
//!
//! Validation errors are fatal and raised at construction time; parse
//! errors are recoverable and surfaced to the metrics engine instead of
//! being propagated.

use chrono::{DateTime, NaiveTime, Utc};
use thiserror::Error;

/// Core error type for blockplan-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Candidate schedule parsing errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid time range
    #[error("Invalid time range: end ({end}) must be greater than start ({start})")]
    InvalidTimeRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Invalid working-hours window
    #[error("Invalid working hours: end ({end}) must be after start ({start})")]
    InvalidWorkingWindow { start: NaiveTime, end: NaiveTime },

    /// A quantity that must be strictly positive
    #[error("'{field}' must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised while parsing an externally generated candidate schedule.
///
/// These are recoverable: the caller records them in a
/// [`GenerationReport`](crate::metrics::GenerationReport) and the metrics
/// engine reports `parsing_success = false` instead of failing.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The payload is not valid JSON at all
    #[error("Candidate schedule is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload parsed but is not an array of event records
    #[error("Candidate schedule must be a JSON array of events, got {found}")]
    NotAnArray { found: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
