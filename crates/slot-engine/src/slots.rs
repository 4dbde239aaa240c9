//! Partition availability ranges into fixed-duration bookable slots.
//!
//! Slots start at the range start and advance by the slot duration. A trailing
//! remainder shorter than one slot is dropped.

use crate::error::ValidationError;
use crate::time_range::TimeRange;

/// Split `range` into consecutive slots of exactly `duration_minutes`.
///
/// `slot[i] = [start + i*d, start + (i+1)*d)` for every `i` with
/// `start + (i+1)*d <= end`. The result is chronological and contiguous.
///
/// # Errors
/// Returns `ValidationError::InvalidDuration` when `duration_minutes` is 0.
pub fn generate_slots(
    range: &TimeRange,
    duration_minutes: u32,
) -> Result<Vec<TimeRange>, ValidationError> {
    if duration_minutes == 0 {
        return Err(ValidationError::InvalidDuration(0));
    }

    // `i * d` never exceeds the range length, so no step can overflow.
    let start = range.start_minute();
    let count = range.duration_minutes() / duration_minutes;
    (0..count)
        .map(|i| {
            let slot_start = start + i * duration_minutes;
            TimeRange::from_minutes(slot_start, slot_start + duration_minutes)
        })
        .collect()
}

/// Generate slots for every range of a day and concatenate them in input order.
///
/// Ranges are processed independently; overlapping source ranges may yield
/// duplicate slots, which are kept.
pub fn generate_day_slots(
    ranges: &[TimeRange],
    duration_minutes: u32,
) -> Result<Vec<TimeRange>, ValidationError> {
    let mut all = Vec::new();
    for range in ranges {
        all.extend(generate_slots(range, duration_minutes)?);
    }
    Ok(all)
}

/// Drop repeated slots, keeping the first occurrence of each.
pub fn dedup_slots(slots: Vec<TimeRange>) -> Vec<TimeRange> {
    let mut seen = std::collections::HashSet::with_capacity(slots.len());
    slots.into_iter().filter(|slot| seen.insert(*slot)).collect()
}
