//! Orchestration of slot generation, overlap detection and the two stores.
//!
//! Write paths (publishing availability, creating and updating bookings) hold the
//! `(talent_id, date)` keys they touch for the whole read-check-write sequence.
//! Read paths take no keys.

use std::collections::BTreeMap;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result, ValidationError};
use crate::events::{BookingEvent, BookingEventKind, BookingEvents};
use crate::locks::{KeyedLocks, LockKey};
use crate::model::{AvailabilityWindow, Booking, BookingPatch, BookingStatus, NewBooking};
use crate::overlap::first_collision;
use crate::slots::{dedup_slots, generate_day_slots};
use crate::store::{AvailabilityStore, BookingStore, InMemoryStore};
use crate::time_range::{format_date, parse_date, TimeRange};

/// Free and booked slot labels per date, keyed by `YYYY-MM-DD`.
///
/// Every date that was considered appears in both maps, possibly with an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeSlots {
    pub available_slots: BTreeMap<String, Vec<String>>,
    pub booked_slots: BTreeMap<String, Vec<String>>,
}

pub struct AvailabilityService {
    availability: Arc<dyn AvailabilityStore>,
    bookings: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    locks: KeyedLocks,
    events: BookingEvents,
}

impl AvailabilityService {
    /// Build a service reading "now" from the system clock in `config.timezone`.
    ///
    /// # Errors
    /// Returns a `ValidationError` if the configuration is invalid.
    pub fn new(
        availability: Arc<dyn AvailabilityStore>,
        bookings: Arc<dyn BookingStore>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let clock = Arc::new(SystemClock::new(config.tz()?));
        let events = BookingEvents::with_capacity(config.event_buffer);
        Ok(Self {
            availability,
            bookings,
            clock,
            config,
            locks: KeyedLocks::new(),
            events,
        })
    }

    /// Build a service over a single in-memory store.
    pub fn in_memory(store: InMemoryStore, config: EngineConfig) -> Result<Self> {
        let store = Arc::new(store);
        Self::new(store.clone(), store, config)
    }

    /// Replace the clock, e.g. with a [`crate::clock::FixedClock`].
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Receive an event for every booking created or changed from now on.
    pub fn subscribe(&self) -> Receiver<BookingEvent> {
        self.events.subscribe()
    }

    // ── publish ─────────────────────────────────────────────────────────────

    /// Add `ranges` to the talent's window for `date`.
    ///
    /// The request is all-or-nothing: if any range overlaps a range held by an
    /// existing booking on that date, nothing is written. Otherwise the ranges are
    /// appended in order to the existing window (or a new window is created).
    /// Ranges are not merged or de-duplicated, so repeating a publish appends again.
    ///
    /// # Errors
    /// - `Validation` for an empty talent id, no ranges, a malformed or past date.
    /// - `Collision` naming the first conflicting pair.
    /// - `Store` if either store fails.
    #[tracing::instrument(skip(self, ranges), fields(range_count = ranges.len()))]
    pub fn publish_availability(
        &self,
        talent_id: &str,
        date: &str,
        ranges: &[TimeRange],
    ) -> Result<AvailabilityWindow> {
        if talent_id.trim().is_empty() {
            return Err(ValidationError::MissingField("talent_id").into());
        }
        if ranges.is_empty() {
            return Err(ValidationError::MissingField("available_slots").into());
        }
        let date = parse_date(date)?;
        if date < self.clock.today() {
            return Err(ValidationError::PastDate(date).into());
        }

        let _guard = self.locks.lock(LockKey::new(talent_id, date));

        let held = self.held_ranges(talent_id, date)?;
        if let Some(collision) = first_collision(ranges, &held, self.config.overlap_rule) {
            warn!(
                talent_id,
                %date,
                range = %collision.proposed,
                booked = %collision.held,
                "availability collides with an existing booking"
            );
            return Err(EngineError::Collision {
                date,
                range: collision.proposed,
                booked: collision.held,
            });
        }

        let now = self.clock.now_utc();
        let window = match self.availability.find(talent_id, date)? {
            Some(mut existing) => {
                existing.slots.extend_from_slice(ranges);
                existing.updated_at = now;
                existing
            }
            None => AvailabilityWindow::new(talent_id, date, ranges.to_vec(), now),
        };

        let saved = self.availability.upsert(window)?;
        info!(
            talent_id,
            %date,
            total_ranges = saved.slots.len(),
            "availability published"
        );
        Ok(saved)
    }

    // ── query ───────────────────────────────────────────────────────────────

    /// Free and booked slots of `duration_minutes` for every window dated today or
    /// later, with "now" taken from the service clock.
    pub fn query_free_slots(&self, talent_id: &str, duration_minutes: i64) -> Result<FreeSlots> {
        self.query_free_slots_at(talent_id, duration_minutes, self.clock.now_local())
    }

    /// Same as [`Self::query_free_slots`] with an explicit local "now".
    ///
    /// For future dates every generated slot is classified as available or booked.
    /// For today, a slot is classified only if it starts strictly after `now`; an
    /// already-started slot is still listed as booked when a booking covers it, and
    /// dropped otherwise. Windows dated before today are skipped.
    ///
    /// Any failure aborts the whole query.
    #[tracing::instrument(skip(self))]
    pub fn query_free_slots_at(
        &self,
        talent_id: &str,
        duration_minutes: i64,
        now: NaiveDateTime,
    ) -> Result<FreeSlots> {
        if talent_id.trim().is_empty() {
            return Err(ValidationError::MissingField("talent_id").into());
        }
        let duration = self.config.check_duration(duration_minutes)?;
        let today = now.date();
        let rule = self.config.overlap_rule;

        let mut result = FreeSlots::default();
        let windows = self.availability.list_for_talent(talent_id)?;

        for window in windows.iter().filter(|w| w.date >= today) {
            let candidates = dedup_slots(generate_day_slots(&window.slots, duration)?);
            let held = self.held_ranges(talent_id, window.date)?;

            let mut available = Vec::new();
            let mut booked = Vec::new();
            for slot in &candidates {
                let is_booked = rule.overlaps_any(slot, &held);
                let started = window.date == today && slot.on(window.date).0 <= now;
                match (is_booked, started) {
                    (true, _) => booked.push(slot.label()),
                    (false, false) => available.push(slot.label()),
                    (false, true) => {}
                }
            }

            debug!(
                talent_id,
                date = %window.date,
                candidates = candidates.len(),
                available = available.len(),
                booked = booked.len(),
                "classified slots"
            );
            let key = format_date(window.date);
            result.available_slots.insert(key.clone(), available);
            result.booked_slots.insert(key, booked);
        }

        Ok(result)
    }

    // ── bookings ────────────────────────────────────────────────────────────

    /// Create one booking per requested date.
    ///
    /// Every requested range must span exactly `card_duration` minutes, must not have
    /// started yet, must lie inside a published range of that date's window (unless
    /// disabled in the config), and must not overlap another requested range or a
    /// range held by an existing booking. Any failure rejects the whole request.
    #[tracing::instrument(skip(self, request), fields(talent_id = %request.talent_id))]
    pub fn create_booking(&self, request: NewBooking) -> Result<Vec<Booking>> {
        request.validate_fields()?;
        let duration = self.config.check_duration(i64::from(request.card_duration))?;
        let now_local = self.clock.now_local();
        let requested = self.parse_requested(&request, duration, now_local)?;

        let keys = requested
            .keys()
            .map(|date| LockKey::new(request.talent_id.as_str(), *date))
            .collect();
        let _guard = self.locks.lock_all(keys);

        for (date, ranges) in &requested {
            self.check_bookable(&request.talent_id, *date, ranges)?;
        }

        let now = self.clock.now_utc();
        let mut created = Vec::with_capacity(requested.len());
        for (date, ranges) in requested {
            let booking = Booking {
                booking_id: Uuid::new_v4().to_string(),
                talent_id: request.talent_id.clone(),
                user_id: request.user_id.clone(),
                card_id: request.card_id.clone(),
                card_title: request.card_title.clone(),
                session_type: request.session_type,
                date,
                booked_time: ranges,
                status: BookingStatus::Scheduled,
                payment_status: request.payment_status,
                special_requests: request.special_requests.clone(),
                created_at: now,
                updated_at: now,
            };
            let booking = self.bookings.create(booking)?;
            info!(
                booking_id = %booking.booking_id,
                %date,
                ranges = booking.booked_time.len(),
                "booking created"
            );
            self.events
                .publish(BookingEvent::new(&booking, BookingEventKind::Created));
            created.push(booking);
        }

        Ok(created)
    }

    /// Apply `patch` to a booking.
    ///
    /// # Errors
    /// - `NotFound` if no booking has this id.
    /// - `Validation` for an empty patch or a disallowed status transition.
    #[tracing::instrument(skip(self, patch))]
    pub fn update_booking(&self, booking_id: &str, patch: &BookingPatch) -> Result<Booking> {
        let current = self
            .bookings
            .find_by_id(booking_id)?
            .ok_or_else(|| EngineError::NotFound(format!("booking {booking_id}")))?;

        let _guard = self
            .locks
            .lock(LockKey::new(current.talent_id.as_str(), current.date));

        // Re-read under the key; another writer may have changed it meanwhile.
        let mut booking = self
            .bookings
            .find_by_id(booking_id)?
            .ok_or_else(|| EngineError::NotFound(format!("booking {booking_id}")))?;
        let previous = booking.status;

        patch.apply(&mut booking, self.clock.now_utc())?;
        let booking = self.bookings.update(booking)?;

        let kind = if booking.status != previous {
            BookingEventKind::StatusChanged {
                from: previous,
                to: booking.status,
            }
        } else {
            BookingEventKind::Updated
        };
        info!(booking_id, status = %booking.status, "booking updated");
        self.events.publish(BookingEvent::new(&booking, kind));
        Ok(booking)
    }

    // ── listings ────────────────────────────────────────────────────────────

    /// Raw availability windows of a talent, sorted by date.
    pub fn list_windows(&self, talent_id: &str) -> Result<Vec<AvailabilityWindow>> {
        Ok(self.availability.list_for_talent(talent_id)?)
    }

    pub fn bookings_for_talent(&self, talent_id: &str) -> Result<Vec<Booking>> {
        Ok(self.bookings.list_for_talent(talent_id)?)
    }

    pub fn bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>> {
        Ok(self.bookings.list_for_user(user_id)?)
    }

    // ── helpers ─────────────────────────────────────────────────────────────

    /// Ranges still occupied by bookings of `talent_id` on `date`.
    fn held_ranges(&self, talent_id: &str, date: NaiveDate) -> Result<Vec<TimeRange>> {
        Ok(self
            .bookings
            .find_by_talent_and_date(talent_id, date)?
            .into_iter()
            .filter(|b| b.status.holds_time())
            .flat_map(|b| b.booked_time)
            .collect())
    }

    /// Parse and group the requested ranges by date, rejecting malformed,
    /// wrongly-sized, already-started and mutually overlapping ranges.
    fn parse_requested(
        &self,
        request: &NewBooking,
        duration: u32,
        now: NaiveDateTime,
    ) -> Result<BTreeMap<NaiveDate, Vec<TimeRange>>> {
        let mut by_date: BTreeMap<NaiveDate, Vec<TimeRange>> = BTreeMap::new();

        for entry in &request.slots {
            let date = parse_date(&entry.booking_date)?;
            if date < now.date() {
                return Err(ValidationError::PastDate(date).into());
            }

            for label in &entry.time_slots {
                let range: TimeRange = label.parse()?;
                if range.duration_minutes() != duration {
                    return Err(ValidationError::DurationMismatch {
                        date,
                        range,
                        expected: duration,
                        actual: range.duration_minutes(),
                    }
                    .into());
                }
                if range.on(date).0 <= now {
                    return Err(ValidationError::PastSlot { date, range }.into());
                }

                let ranges = by_date.entry(date).or_default();
                if let Some(other) = ranges
                    .iter()
                    .find(|r| self.config.overlap_rule.overlaps(r, &range))
                {
                    return Err(EngineError::Collision {
                        date,
                        range,
                        booked: *other,
                    });
                }
                ranges.push(range);
            }
        }

        Ok(by_date)
    }

    /// Check `ranges` against the window and the existing bookings of one date.
    fn check_bookable(
        &self,
        talent_id: &str,
        date: NaiveDate,
        ranges: &[TimeRange],
    ) -> Result<()> {
        if self.config.require_availability_for_bookings {
            let window = self.availability.find(talent_id, date)?;
            for range in ranges {
                let covered = window.as_ref().is_some_and(|w| w.covers(range));
                if !covered {
                    return Err(ValidationError::OutsideAvailability {
                        date,
                        range: *range,
                    }
                    .into());
                }
            }
        }

        let held = self.held_ranges(talent_id, date)?;
        if let Some(collision) = first_collision(ranges, &held, self.config.overlap_rule) {
            warn!(
                talent_id,
                %date,
                range = %collision.proposed,
                booked = %collision.held,
                "booking collides with an existing booking"
            );
            return Err(EngineError::Collision {
                date,
                range: collision.proposed,
                booked: collision.held,
            });
        }
        Ok(())
    }
}
