//! Wall-clock time ranges and the boundary encodings for dates and times.
//!
//! A [`TimeRange`] has no date of its own; it is always interpreted relative to
//! the date of the record that contains it. Times have minute resolution.
//!
//! Boundary formats:
//! - dates: `YYYY-MM-DD`
//! - times: `HH:MM` (24-hour)
//! - slot labels: `HH:MM-HH:MM`

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// Minutes in a calendar day; no range may end past the last minute of its day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Parse a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(value.to_string()))
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a time of day in `HH:MM` form.
pub fn parse_time(value: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT)
        .map_err(|_| ValidationError::InvalidTime(value.to_string()))
}

/// Minutes elapsed since midnight, ignoring seconds.
pub fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn time_from_minutes(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

/// An ordered pair of wall-clock times, `start < end`.
///
/// Intervals are half-open: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawTimeRange", into = "RawTimeRange")]
pub struct TimeRange {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeRange {
    /// Build a range, truncating both ends to the minute.
    ///
    /// # Errors
    /// Returns `ValidationError::InvalidRange` unless `start < end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ValidationError> {
        Self::from_minutes(minute_of_day(start), minute_of_day(end))
    }

    /// Build a range from minute-of-day offsets.
    pub fn from_minutes(start: u32, end: u32) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidRange {
            value: format!("{start}..{end} minutes"),
            reason: reason.to_string(),
        };
        if start >= end {
            return Err(invalid("start must be before end"));
        }
        let start_time =
            time_from_minutes(start).ok_or_else(|| invalid("start is past midnight"))?;
        let end_time = time_from_minutes(end).ok_or_else(|| invalid("end is past midnight"))?;
        Ok(Self {
            start: start_time,
            end: end_time,
        })
    }

    /// Parse a pair of `HH:MM` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        let start_time = parse_time(start)?;
        let end_time = parse_time(end)?;
        if start_time >= end_time {
            return Err(ValidationError::InvalidRange {
                value: format!("{}-{}", start.trim(), end.trim()),
                reason: "start must be before end".to_string(),
            });
        }
        Self::new(start_time, end_time)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn start_minute(&self) -> u32 {
        minute_of_day(self.start)
    }

    pub fn end_minute(&self) -> u32 {
        minute_of_day(self.end)
    }

    pub fn duration_minutes(&self) -> u32 {
        self.end_minute() - self.start_minute()
    }

    /// `true` when `other` lies entirely inside this range.
    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Anchor the range to a calendar date.
    pub fn on(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        (date.and_time(self.start), date.and_time(self.end))
    }

    /// Canonical `HH:MM-HH:MM` label.
    pub fn label(&self) -> String {
        format!(
            "{}-{}",
            self.start.format(TIME_FORMAT),
            self.end.format(TIME_FORMAT)
        )
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for TimeRange {
    type Err = ValidationError;

    /// Parse an `HH:MM-HH:MM` label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((start, end)) if !end.contains('-') => Self::parse(start, end),
            _ => Err(ValidationError::InvalidRange {
                value: s.to_string(),
                reason: "expected HH:MM-HH:MM".to_string(),
            }),
        }
    }
}

/// Wire shape of a [`TimeRange`]: `{"startTime": "HH:MM", "endTime": "HH:MM"}`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTimeRange {
    start_time: String,
    end_time: String,
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = ValidationError;

    fn try_from(raw: RawTimeRange) -> Result<Self, Self::Error> {
        TimeRange::parse(&raw.start_time, &raw.end_time)
    }
}

impl From<TimeRange> for RawTimeRange {
    fn from(range: TimeRange) -> Self {
        Self {
            start_time: range.start.format(TIME_FORMAT).to_string(),
            end_time: range.end.format(TIME_FORMAT).to_string(),
        }
    }
}
