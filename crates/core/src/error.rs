//! Error types for the stock-to-flow pipeline.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the stock-to-flow pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Source file does not exist.
    #[error("source file not found: {0}")]
    NotFound(PathBuf),

    /// A data row's field count does not match the header.
    #[error("row {row}: expected {expected} fields, found {found}")]
    MalformedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A date field could not be parsed.
    #[error("row {row}: invalid timestamp {text:?}")]
    InvalidTimestamp { row: usize, text: String },

    /// The final resampling period holds too little data for the
    /// boundary correction to be defined.
    #[error("insufficient data in final period: {missing_days} of {period_days} day(s) missing")]
    InsufficientFinalPeriodData {
        missing_days: f64,
        period_days: f64,
    },

    /// No calendar grid points are shared by all input series.
    #[error("no common grid points across input series")]
    EmptyIntersection,

    /// Stock-to-flow is undefined where the flow is zero.
    #[error("stock-to-flow undefined at {date}: flow is zero")]
    UndefinedRatio { date: NaiveDate },

    /// Data error (invalid or inconsistent data).
    #[error("data error: {0}")]
    Data(String),

    /// Insufficient data for computation.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create an insufficient data error.
    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Error::InsufficientData(msg.into())
    }
}
