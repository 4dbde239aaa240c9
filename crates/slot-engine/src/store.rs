//! Storage contracts for availability windows and bookings, plus an in-memory
//! implementation.
//!
//! The in-memory store keeps everything behind `parking_lot` locks. It is suitable
//! for tests, the CLI, and single-process deployments; a [`Snapshot`] of it can be
//! written to and restored from JSON.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{AvailabilityWindow, Booking};

/// Persists one [`AvailabilityWindow`] per `(talent_id, date)`.
pub trait AvailabilityStore: Send + Sync {
    fn find(
        &self,
        talent_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityWindow>, StoreError>;

    /// Insert the window, replacing any existing window for the same key.
    fn upsert(&self, window: AvailabilityWindow) -> Result<AvailabilityWindow, StoreError>;

    /// All windows of a talent, sorted by date.
    fn list_for_talent(&self, talent_id: &str) -> Result<Vec<AvailabilityWindow>, StoreError>;
}

/// Persists [`Booking`]s keyed by `booking_id`.
pub trait BookingStore: Send + Sync {
    fn find_by_talent_and_date(
        &self,
        talent_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, StoreError>;

    fn find_by_id(&self, booking_id: &str) -> Result<Option<Booking>, StoreError>;

    /// # Errors
    /// Returns `StoreError::Duplicate` if the booking id is already taken.
    fn create(&self, booking: Booking) -> Result<Booking, StoreError>;

    /// # Errors
    /// Returns `StoreError::Missing` if no booking has this id.
    fn update(&self, booking: Booking) -> Result<Booking, StoreError>;

    fn list_for_talent(&self, talent_id: &str) -> Result<Vec<Booking>, StoreError>;

    fn list_for_user(&self, user_id: &str) -> Result<Vec<Booking>, StoreError>;
}

type WindowKey = (String, NaiveDate);

/// Serializable copy of an [`InMemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub windows: Vec<AvailabilityWindow>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
}

/// In-memory implementation of both store traits.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    windows: Arc<RwLock<BTreeMap<WindowKey, AvailabilityWindow>>>,
    bookings: Arc<RwLock<HashMap<String, Booking>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a snapshot.
    ///
    /// # Errors
    /// Returns `StoreError::Duplicate` if two windows share a `(talent_id, date)` or
    /// two bookings share an id.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        let mut windows = BTreeMap::new();
        for window in snapshot.windows {
            let key = (window.talent_id.clone(), window.date);
            if windows.contains_key(&key) {
                return Err(StoreError::Duplicate(format!(
                    "window {} {}",
                    window.talent_id, window.date
                )));
            }
            windows.insert(key, window);
        }

        let mut bookings = HashMap::new();
        for booking in snapshot.bookings {
            if bookings.contains_key(&booking.booking_id) {
                return Err(StoreError::Duplicate(format!("booking {}", booking.booking_id)));
            }
            bookings.insert(booking.booking_id.clone(), booking);
        }

        Ok(Self {
            windows: Arc::new(RwLock::new(windows)),
            bookings: Arc::new(RwLock::new(bookings)),
        })
    }

    /// Copy the current contents. Windows are ordered by talent then date, bookings
    /// by date then creation time.
    pub fn snapshot(&self) -> Snapshot {
        let windows = self.windows.read().values().cloned().collect();
        let bookings = sorted(self.bookings.read().values().cloned().collect());
        Snapshot { windows, bookings }
    }
}

fn sorted(mut bookings: Vec<Booking>) -> Vec<Booking> {
    bookings.sort_by(|a, b| {
        (a.date, a.created_at, &a.booking_id).cmp(&(b.date, b.created_at, &b.booking_id))
    });
    bookings
}

impl AvailabilityStore for InMemoryStore {
    fn find(
        &self,
        talent_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityWindow>, StoreError> {
        Ok(self
            .windows
            .read()
            .get(&(talent_id.to_string(), date))
            .cloned())
    }

    fn upsert(&self, window: AvailabilityWindow) -> Result<AvailabilityWindow, StoreError> {
        let key = (window.talent_id.clone(), window.date);
        self.windows.write().insert(key, window.clone());
        Ok(window)
    }

    fn list_for_talent(&self, talent_id: &str) -> Result<Vec<AvailabilityWindow>, StoreError> {
        // BTreeMap order is (talent_id, date), so the range is already date-sorted.
        let windows = self.windows.read();
        let first = (talent_id.to_string(), NaiveDate::MIN);
        let last = (talent_id.to_string(), NaiveDate::MAX);
        Ok(windows
            .range(first..=last)
            .map(|(_, w)| w.clone())
            .collect())
    }
}

impl BookingStore for InMemoryStore {
    fn find_by_talent_and_date(
        &self,
        talent_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, StoreError> {
        let bookings = self.bookings.read();
        Ok(sorted(
            bookings
                .values()
                .filter(|b| b.talent_id == talent_id && b.date == date)
                .cloned()
                .collect(),
        ))
    }

    fn find_by_id(&self, booking_id: &str) -> Result<Option<Booking>, StoreError> {
        Ok(self.bookings.read().get(booking_id).cloned())
    }

    fn create(&self, booking: Booking) -> Result<Booking, StoreError> {
        let mut bookings = self.bookings.write();
        if bookings.contains_key(&booking.booking_id) {
            return Err(StoreError::Duplicate(format!("booking {}", booking.booking_id)));
        }
        bookings.insert(booking.booking_id.clone(), booking.clone());
        Ok(booking)
    }

    fn update(&self, booking: Booking) -> Result<Booking, StoreError> {
        let mut bookings = self.bookings.write();
        match bookings.get_mut(&booking.booking_id) {
            Some(existing) => {
                *existing = booking.clone();
                Ok(booking)
            }
            None => Err(StoreError::Missing(format!("booking {}", booking.booking_id))),
        }
    }

    fn list_for_talent(&self, talent_id: &str) -> Result<Vec<Booking>, StoreError> {
        let bookings = self.bookings.read();
        Ok(sorted(
            bookings
                .values()
                .filter(|b| b.talent_id == talent_id)
                .cloned()
                .collect(),
        ))
    }

    fn list_for_user(&self, user_id: &str) -> Result<Vec<Booking>, StoreError> {
        let bookings = self.bookings.read();
        Ok(sorted(
            bookings
                .values()
                .filter(|b| b.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }
}
