//! Per-`(talent_id, date)` write serialization.
//!
//! Every write path reads bookings, checks for collisions, then writes. Holding the
//! key for the whole sequence closes the read-check-write race between two
//! concurrent writers for the same talent and day. Different keys never block
//! each other, and readers never take a key.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use parking_lot::{Condvar, Mutex};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LockKey {
    pub talent_id: String,
    pub date: NaiveDate,
}

impl LockKey {
    pub fn new(talent_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            talent_id: talent_id.into(),
            date,
        }
    }
}

/// Table of held keys. A key is held by at most one guard at a time.
#[derive(Default)]
pub struct KeyedLocks {
    held: Mutex<BTreeSet<LockKey>>,
    released: Condvar,
}

/// Releases its keys on drop.
#[must_use = "keys are released as soon as the guard is dropped"]
pub struct KeyGuard<'a> {
    locks: &'a KeyedLocks,
    keys: Vec<LockKey>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `key` is free, then hold it.
    pub fn lock(&self, key: LockKey) -> KeyGuard<'_> {
        self.lock_all(vec![key])
    }

    /// Block until every key in `keys` is free, then hold all of them at once.
    ///
    /// Keys are taken together rather than one by one, so two callers with
    /// intersecting key sets cannot deadlock.
    pub fn lock_all(&self, mut keys: Vec<LockKey>) -> KeyGuard<'_> {
        keys.sort();
        keys.dedup();

        let mut held = self.held.lock();
        while keys.iter().any(|k| held.contains(k)) {
            self.released.wait(&mut held);
        }
        held.extend(keys.iter().cloned());

        KeyGuard { locks: self, keys }
    }

    /// Number of keys currently held.
    pub fn held_count(&self) -> usize {
        self.held.lock().len()
    }
}

impl KeyGuard<'_> {
    pub fn keys(&self) -> &[LockKey] {
        &self.keys
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        let mut held = self.locks.held.lock();
        for key in &self.keys {
            held.remove(key);
        }
        drop(held);
        self.locks.released.notify_all();
    }
}
