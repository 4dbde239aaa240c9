//! # slot-engine
//!
//! Availability and collision checks for a talent-booking marketplace.
//!
//! Talents publish per-date availability windows made of wall-clock time ranges.
//! Clients book fixed-duration slots inside those windows. This crate partitions
//! windows into slots, decides which slots are already taken, and refuses writes
//! that would make availability and bookings overlap.
//!
//! ## Modules
//!
//! - [`time_range`] — `TimeRange` and the `YYYY-MM-DD` / `HH:MM` boundary formats
//! - [`slots`] — Partition a range into consecutive fixed-duration slots
//! - [`overlap`] — Overlap rules and pairwise collision detection
//! - [`model`] — Availability windows, bookings, booking requests and patches
//! - [`store`] — Storage traits and the in-memory store
//! - [`locks`] — Per-`(talent, date)` write serialization
//! - [`events`] — Booking change fan-out
//! - [`clock`] — Timezone-aware source of "now"
//! - [`config`] — Engine configuration
//! - [`service`] — Publish, query and booking operations
//! - [`error`] — Error types
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use slot_engine::{AvailabilityService, EngineConfig, FixedClock, InMemoryStore, TimeRange};
//!
//! let now = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
//! let service = AvailabilityService::in_memory(InMemoryStore::new(), EngineConfig::default())
//!     .unwrap()
//!     .with_clock(Arc::new(FixedClock::utc(now)));
//!
//! let window: TimeRange = "09:00-10:00".parse().unwrap();
//! service.publish_availability("talent-1", "2026-03-02", &[window]).unwrap();
//!
//! let free = service.query_free_slots("talent-1", 30).unwrap();
//! assert_eq!(free.available_slots["2026-03-02"], vec!["09:00-09:30", "09:30-10:00"]);
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod locks;
pub mod model;
pub mod overlap;
pub mod service;
pub mod slots;
pub mod store;
pub mod time_range;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use error::{EngineError, ErrorKind, StoreError, ValidationError};
pub use events::{BookingEvent, BookingEventKind};
pub use model::{
    AvailabilityWindow, Booking, BookingPatch, BookingStatus, DateSlots, NewBooking,
    PaymentStatus, SessionType,
};
pub use overlap::{find_collisions, OverlapRule};
pub use service::{AvailabilityService, FreeSlots};
pub use slots::generate_slots;
pub use store::{AvailabilityStore, BookingStore, InMemoryStore, Snapshot};
pub use time_range::TimeRange;
