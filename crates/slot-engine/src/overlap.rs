//! Detect overlapping time ranges on a single day.
//!
//! Performs pairwise comparison between a proposed list of ranges and the ranges
//! already held by bookings.

use serde::{Deserialize, Serialize};

use crate::time_range::TimeRange;

/// Boundary rule used when deciding whether two ranges intersect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapRule {
    /// `a.start < b.end && b.start < a.end`.
    ///
    /// Adjacent ranges, where one ends exactly when the other starts, do not overlap.
    #[default]
    HalfOpen,
    /// `!(a.end < b.start || a.start > b.end)`.
    ///
    /// Both endpoints are inclusive, so adjacent ranges overlap.
    Inclusive,
}

impl OverlapRule {
    pub fn overlaps(self, a: &TimeRange, b: &TimeRange) -> bool {
        match self {
            OverlapRule::HalfOpen => a.start() < b.end() && b.start() < a.end(),
            OverlapRule::Inclusive => !(a.end() < b.start() || a.start() > b.end()),
        }
    }

    /// `true` if `range` overlaps any member of `held`.
    pub fn overlaps_any(self, range: &TimeRange, held: &[TimeRange]) -> bool {
        held.iter().any(|h| self.overlaps(range, h))
    }
}

/// A proposed range that intersects a held range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collision {
    pub proposed: TimeRange,
    pub held: TimeRange,
    pub overlap_minutes: u32,
}

/// Find all pairwise collisions between `proposed` and `held` under `rule`.
///
/// The overlap duration is `min(a.end, b.end) - max(a.start, b.start)`, which is
/// zero for ranges that only touch under [`OverlapRule::Inclusive`].
pub fn find_collisions(
    proposed: &[TimeRange],
    held: &[TimeRange],
    rule: OverlapRule,
) -> Vec<Collision> {
    let mut collisions = Vec::new();

    for a in proposed {
        for b in held {
            if rule.overlaps(a, b) {
                collisions.push(collision(a, b));
            }
        }
    }

    collisions
}

/// Return the first collision, scanning `proposed` in order.
pub fn first_collision(
    proposed: &[TimeRange],
    held: &[TimeRange],
    rule: OverlapRule,
) -> Option<Collision> {
    proposed.iter().find_map(|a| {
        held.iter()
            .find(|b| rule.overlaps(a, b))
            .map(|b| collision(a, b))
    })
}

fn collision(a: &TimeRange, b: &TimeRange) -> Collision {
    let overlap_start = a.start_minute().max(b.start_minute());
    let overlap_end = a.end_minute().min(b.end_minute());
    Collision {
        proposed: *a,
        held: *b,
        overlap_minutes: overlap_end.saturating_sub(overlap_start),
    }
}
