//! Fan-out of booking changes to subscribers.
//!
//! Subscribers receive an event each time a booking is created or changed,
//! instead of polling the booking store on a timer.
//!
//! Each subscriber has a bounded queue. Publishing never blocks: a subscriber
//! whose queue is full is disconnected, and its receiver reports
//! `Disconnected` once the queued events have been drained.

use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};

use parking_lot::Mutex;
use serde::Serialize;

use crate::model::{Booking, BookingStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingEventKind {
    Created,
    StatusChanged {
        from: BookingStatus,
        to: BookingStatus,
    },
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingEvent {
    pub booking_id: String,
    pub talent_id: String,
    pub user_id: String,
    pub kind: BookingEventKind,
}

impl BookingEvent {
    pub fn new(booking: &Booking, kind: BookingEventKind) -> Self {
        Self {
            booking_id: booking.booking_id.clone(),
            talent_id: booking.talent_id.clone(),
            user_id: booking.user_id.clone(),
            kind,
        }
    }
}

pub struct BookingEvents {
    subscribers: Mutex<Vec<SyncSender<BookingEvent>>>,
    capacity: usize,
}

impl BookingEvents {
    /// `capacity` is the number of undelivered events each subscriber may hold.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// Register a subscriber. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> Receiver<BookingEvent> {
        let (tx, rx) = sync_channel(self.capacity);
        self.subscribers.lock().push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber, pruning closed and lagging ones.
    pub fn publish(&self, event: BookingEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    booking_id = %event.booking_id,
                    capacity = self.capacity,
                    "subscriber queue full, disconnecting"
                );
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
        tracing::trace!(
            booking_id = %event.booking_id,
            subscribers = subscribers.len(),
            "booking event published"
        );
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
