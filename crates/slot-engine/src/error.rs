//! Error types for slot-engine operations.

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::BookingStatus;
use crate::time_range::TimeRange;

/// Malformed input. Always reported to the caller; no mutation happens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid time '{0}': expected HH:MM")]
    InvalidTime(String),

    #[error("Invalid time range '{value}': {reason}")]
    InvalidRange { value: String, reason: String },

    #[error("Invalid slot duration: {0} minutes")]
    InvalidDuration(i64),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Date {0} is in the past")]
    PastDate(NaiveDate),

    #[error("Range {range} on {date} has already started")]
    PastSlot { date: NaiveDate, range: TimeRange },

    #[error("Range {range} on {date} spans {actual} minutes, expected {expected}")]
    DurationMismatch {
        date: NaiveDate,
        range: TimeRange,
        expected: u32,
        actual: u32,
    },

    #[error("Range {range} on {date} is outside the published availability")]
    OutsideAvailability { date: NaiveDate, range: TimeRange },

    #[error("Cannot move booking from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Patch does not change any field")]
    EmptyPatch,

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Event buffer must hold at least one event, got {0}")]
    InvalidEventBuffer(usize),
}

/// Failure reported by a backing store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Missing record: {0}")]
    Missing(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Backend failure: {0}")]
    Backend(String),
}

/// Top-level error returned by [`crate::service::AvailabilityService`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A proposed range overlaps a range already held by a booking.
    #[error("Range {range} on {date} collides with booked {booked}")]
    Collision {
        date: NaiveDate,
        range: TimeRange,
        booked: TimeRange,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Coarse classification of an [`EngineError`], for mapping onto transport codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Collision,
    NotFound,
    Store,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation(_) => ErrorKind::Validation,
            EngineError::Collision { .. } => ErrorKind::Collision,
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::Store(_) => ErrorKind::Store,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
