//! Source of "now" for the today-cutoff and record timestamps.
//!
//! Wall-clock times carry no timezone, so "now" is taken as a local datetime in
//! the configured IANA zone.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

pub trait Clock: Send + Sync {
    /// Current local datetime in the engine's zone.
    fn now_local(&self) -> NaiveDateTime;

    /// Current instant, used for `created_at` / `updated_at`.
    fn now_utc(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now_local().date()
    }
}

/// Reads the system clock and converts it into `tz`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Clock for SystemClock {
    fn now_local(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same local datetime.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    local: NaiveDateTime,
    tz: Tz,
}

impl FixedClock {
    pub fn new(local: NaiveDateTime, tz: Tz) -> Self {
        Self { local, tz }
    }

    /// A fixed clock in UTC.
    pub fn utc(local: NaiveDateTime) -> Self {
        Self::new(local, Tz::UTC)
    }
}

impl Clock for FixedClock {
    fn now_local(&self) -> NaiveDateTime {
        self.local
    }

    fn now_utc(&self) -> DateTime<Utc> {
        // A local time inside a DST gap has no instant; fall back to reading it as UTC.
        self.tz
            .from_local_datetime(&self.local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| self.local.and_utc())
    }
}
