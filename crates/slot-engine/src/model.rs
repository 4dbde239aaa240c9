//! Availability windows, bookings and the requests that create or change them.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::time_range::TimeRange;

/// All ranges a talent has opened on one calendar date.
///
/// There is at most one window per `(talent_id, date)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub talent_id: String,
    #[serde(rename = "available_date")]
    pub date: NaiveDate,
    #[serde(rename = "available_slots")]
    pub slots: Vec<TimeRange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AvailabilityWindow {
    pub fn new(
        talent_id: impl Into<String>,
        date: NaiveDate,
        slots: Vec<TimeRange>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            talent_id: talent_id.into(),
            date,
            slots,
            created_at: now,
            updated_at: now,
        }
    }

    /// `true` if some published range fully contains `range`.
    pub fn covers(&self, range: &TimeRange) -> bool {
        self.slots.iter().any(|slot| slot.contains(range))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionType {
    CoffeeCall,
    #[default]
    Regular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentStatus {
    Paid,
    #[default]
    Pending,
}

/// Lifecycle of a booking.
///
/// ```text
/// Scheduled ─┬─> Accepted ─┬─> Completed
///            │             └─> Cancelled
///            ├─> Declined
///            ├─> Completed
///            └─> Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BookingStatus {
    #[default]
    Scheduled,
    Accepted,
    Declined,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Scheduled, Accepted)
                | (Scheduled, Declined)
                | (Scheduled, Completed)
                | (Scheduled, Cancelled)
                | (Accepted, Completed)
                | (Accepted, Cancelled)
        )
    }

    /// Whether a booking in this state still occupies its time.
    pub fn holds_time(self) -> bool {
        !matches!(self, BookingStatus::Cancelled | BookingStatus::Declined)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingStatus::Scheduled => "Scheduled",
            BookingStatus::Accepted => "Accepted",
            BookingStatus::Declined => "Declined",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

/// A client's reservation of one or more ranges on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub booking_id: String,
    pub talent_id: String,
    pub user_id: String,
    pub card_id: String,
    pub card_title: String,
    pub session_type: SessionType,
    #[serde(rename = "booking_date")]
    pub date: NaiveDate,
    pub booked_time: Vec<TimeRange>,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Requested ranges for one date, as `HH:MM-HH:MM` labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSlots {
    pub booking_date: String,
    pub time_slots: Vec<String>,
}

/// Input to [`crate::service::AvailabilityService::create_booking`].
///
/// One [`Booking`] is created per entry in `slots`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub talent_id: String,
    pub user_id: String,
    pub card_id: String,
    pub card_title: String,
    #[serde(default)]
    pub session_type: SessionType,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub special_requests: Option<String>,
    /// Length of every requested range, in minutes.
    pub card_duration: u32,
    pub slots: Vec<DateSlots>,
}

impl NewBooking {
    /// Check required fields; ranges and dates are parsed separately.
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        let required = [
            ("talent_id", &self.talent_id),
            ("user_id", &self.user_id),
            ("card_id", &self.card_id),
            ("card_title", &self.card_title),
        ];
        if let Some((name, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ValidationError::MissingField(*name));
        }
        if self.card_duration == 0 {
            return Err(ValidationError::InvalidDuration(0));
        }
        if self.slots.is_empty() || self.slots.iter().any(|s| s.time_slots.is_empty()) {
            return Err(ValidationError::MissingField("slots"));
        }
        Ok(())
    }
}

/// Fields of a [`Booking`] that may be changed after creation.
///
/// Each field is applied independently; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPatch {
    #[serde(default)]
    pub status: Option<BookingStatus>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub special_requests: Option<String>,
}

impl BookingPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.payment_status.is_none() && self.special_requests.is_none()
    }

    /// Validate every field against `booking`, then apply them.
    ///
    /// Nothing is written to `booking` unless all fields are valid.
    pub fn apply(
        &self,
        booking: &mut Booking,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyPatch);
        }
        if let Some(next) = self.status {
            if !booking.status.can_transition_to(next) {
                return Err(ValidationError::InvalidTransition {
                    from: booking.status,
                    to: next,
                });
            }
        }

        if let Some(next) = self.status {
            booking.status = next;
        }
        if let Some(payment) = self.payment_status {
            booking.payment_status = payment;
        }
        if let Some(requests) = &self.special_requests {
            let trimmed = requests.trim();
            booking.special_requests = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
        booking.updated_at = now;
        Ok(())
    }
}
