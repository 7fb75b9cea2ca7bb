//! Error types for window selection and statistics computation.

use chrono::NaiveDate;
use thiserror::Error;

/// Rejected custom window. Reported before any record subscription exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("custom window start {start} is after end {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },

    #[error("custom window date {date} is outside {min}..={max}")]
    OutOfRange {
        date: NaiveDate,
        min: NaiveDate,
        max: NaiveDate,
    },

    #[error("unknown window preset '{0}'")]
    UnknownPreset(String),
}

/// Failure while producing a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    /// A record reached the engine with an intensity outside 1..=5.
    #[error("record {record_id} has intensity {intensity}, expected 1..=5")]
    InvalidIntensity { record_id: i64, intensity: u8 },

    /// The record source reported a failure (storage error etc.).
    #[error("record source failed: {0}")]
    Source(String),
}
