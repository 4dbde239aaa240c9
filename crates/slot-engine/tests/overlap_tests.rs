//! Tests for overlap detection under both boundary rules.

use slot_engine::overlap::{first_collision, find_collisions, OverlapRule};
use slot_engine::TimeRange;

fn range(label: &str) -> TimeRange {
    label.parse().unwrap()
}

#[test]
fn partial_overlap_detected_with_minutes() {
    let collisions = find_collisions(
        &[range("09:00-10:00")],
        &[range("09:30-10:30")],
        OverlapRule::HalfOpen,
    );
    assert_eq!(collisions.len(), 1);
    assert_eq!(collisions[0].overlap_minutes, 30);
}

#[test]
fn disjoint_ranges_never_overlap() {
    for rule in [OverlapRule::HalfOpen, OverlapRule::Inclusive] {
        assert!(!rule.overlaps(&range("09:00-10:00"), &range("11:00-12:00")));
    }
}

#[test]
fn adjacent_ranges_half_open_do_not_overlap() {
    let rule = OverlapRule::HalfOpen;
    assert!(!rule.overlaps(&range("09:30-10:00"), &range("10:00-10:30")));
    assert!(!rule.overlaps(&range("10:30-11:00"), &range("10:00-10:30")));
}

#[test]
fn adjacent_ranges_inclusive_do_overlap() {
    let rule = OverlapRule::Inclusive;
    assert!(rule.overlaps(&range("09:30-10:00"), &range("10:00-10:30")));
    assert!(rule.overlaps(&range("10:30-11:00"), &range("10:00-10:30")));

    // Touching ranges report zero minutes of overlap.
    let collisions = find_collisions(&[range("09:30-10:00")], &[range("10:00-10:30")], rule);
    assert_eq!(collisions[0].overlap_minutes, 0);
}

#[test]
fn shared_end_overlaps_under_both_rules() {
    for rule in [OverlapRule::HalfOpen, OverlapRule::Inclusive] {
        assert!(rule.overlaps(&range("14:00-15:00"), &range("14:30-15:00")));
    }
}

#[test]
fn contained_range_overlap_is_inner_length() {
    let collisions = find_collisions(
        &[range("09:00-12:00")],
        &[range("10:00-11:00")],
        OverlapRule::HalfOpen,
    );
    assert_eq!(collisions[0].overlap_minutes, 60);
}

#[test]
fn first_collision_follows_proposed_order() {
    let proposed = [range("08:00-08:30"), range("12:00-13:00"), range("09:00-10:00")];
    let held = [range("09:30-10:00"), range("12:30-13:30")];

    let collision = first_collision(&proposed, &held, OverlapRule::HalfOpen).unwrap();
    assert_eq!(collision.proposed, range("12:00-13:00"));
    assert_eq!(collision.held, range("12:30-13:30"));
}

#[test]
fn empty_lists_have_no_collisions() {
    assert!(find_collisions(&[], &[], OverlapRule::HalfOpen).is_empty());
    assert!(first_collision(&[range("09:00-10:00")], &[], OverlapRule::Inclusive).is_none());
}
