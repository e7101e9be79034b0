//! Tests for booking conflict detection.

use activity_calendar::{
    find_conflicts, first_conflict, first_conflict_at, first_conflict_excluding, overlaps,
    GeneratedOccurrence, OccurrenceKey, ScheduledInterval,
};
use chrono::{DateTime, TimeZone, Utc};

fn t(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, min, 0).unwrap()
}

fn booking(
    id: &str,
    location: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> ScheduledInterval {
    ScheduledInterval {
        id: id.to_string(),
        location: location.to_string(),
        start_at: start,
        end_at: end,
    }
}

fn occurrence(start: DateTime<Utc>, end: DateTime<Utc>) -> GeneratedOccurrence {
    GeneratedOccurrence {
        series_id: "bingo".to_string(),
        occurrence_key: OccurrenceKey::from_start(start),
        start_at: start,
        end_at: end,
    }
}

// ---------------------------------------------------------------------------
// overlaps
// ---------------------------------------------------------------------------

#[test]
fn partial_overlap_after_is_a_conflict() {
    assert!(overlaps(t(10, 0), t(11, 0), t(10, 30), t(11, 30)));
}

#[test]
fn partial_overlap_before_is_a_conflict() {
    assert!(overlaps(t(10, 0), t(11, 0), t(9, 30), t(10, 15)));
}

#[test]
fn contained_interval_is_a_conflict() {
    assert!(overlaps(t(10, 0), t(11, 0), t(10, 10), t(10, 20)));
    assert!(overlaps(t(10, 10), t(10, 20), t(10, 0), t(11, 0)));
}

#[test]
fn identical_intervals_conflict() {
    assert!(overlaps(t(10, 0), t(11, 0), t(10, 0), t(11, 0)));
}

#[test]
fn back_to_back_is_not_a_conflict() {
    assert!(!overlaps(t(10, 0), t(11, 0), t(9, 0), t(10, 0)));
    assert!(!overlaps(t(10, 0), t(11, 0), t(11, 0), t(12, 0)));
}

#[test]
fn disjoint_is_not_a_conflict() {
    assert!(!overlaps(t(10, 0), t(11, 0), t(13, 0), t(14, 0)));
}

// ---------------------------------------------------------------------------
// first_conflict*
// ---------------------------------------------------------------------------

#[test]
fn first_conflict_returns_earliest_listed_match() {
    let existing = vec![
        booking("a", "Activity Room", t(8, 0), t(9, 0)),
        booking("b", "Activity Room", t(10, 30), t(11, 30)),
        booking("c", "Activity Room", t(10, 45), t(12, 0)),
    ];
    let hit = first_conflict(t(10, 0), t(11, 0), &existing).expect("should conflict");
    assert_eq!(hit.id, "b");
}

#[test]
fn first_conflict_none_when_all_touching() {
    let existing = vec![
        booking("a", "Activity Room", t(9, 0), t(10, 0)),
        booking("b", "Activity Room", t(11, 0), t(12, 0)),
    ];
    assert!(first_conflict(t(10, 0), t(11, 0), &existing).is_none());
}

#[test]
fn other_locations_do_not_conflict() {
    let existing = vec![
        booking("a", "Chapel", t(10, 0), t(11, 0)),
        booking("b", "Activity Room", t(13, 0), t(14, 0)),
    ];
    assert!(first_conflict_at("Activity Room", t(10, 0), t(11, 0), &existing).is_none());
    assert_eq!(
        first_conflict_at("Chapel", t(10, 30), t(11, 30), &existing).map(|b| b.id.as_str()),
        Some("a")
    );
}

#[test]
fn moving_a_booking_ignores_itself() {
    let existing = vec![
        booking("self", "Chapel", t(10, 0), t(11, 0)),
        booking("other", "Chapel", t(12, 0), t(13, 0)),
    ];
    assert!(first_conflict_excluding("Chapel", t(10, 30), t(11, 30), "self", &existing).is_none());
    assert_eq!(
        first_conflict_excluding("Chapel", t(10, 30), t(12, 30), "self", &existing)
            .map(|b| b.id.as_str()),
        Some("other")
    );
}

#[test]
fn empty_existing_has_no_conflict() {
    assert!(first_conflict_at("Chapel", t(10, 0), t(11, 0), &[]).is_none());
}

// ---------------------------------------------------------------------------
// find_conflicts
// ---------------------------------------------------------------------------

#[test]
fn find_conflicts_reports_overlap_minutes() {
    let occurrences = vec![occurrence(t(9, 0), t(10, 0)), occurrence(t(14, 0), t(15, 0))];
    let bookings = vec![
        booking("a", "Chapel", t(9, 30), t(10, 30)),
        booking("b", "Chapel", t(14, 0), t(14, 20)),
        booking("c", "Chapel", t(15, 0), t(16, 0)),
    ];

    let conflicts = find_conflicts(&occurrences, &bookings);

    assert_eq!(conflicts.len(), 2);
    assert_eq!(conflicts[0].booking.id, "a");
    assert_eq!(conflicts[0].overlap_minutes, 30);
    assert_eq!(conflicts[1].booking.id, "b");
    assert_eq!(conflicts[1].overlap_minutes, 20);
    assert_eq!(conflicts[1].occurrence, occurrences[1]);
}

#[test]
fn find_conflicts_one_occurrence_many_bookings() {
    let occurrences = vec![occurrence(t(9, 0), t(12, 0))];
    let bookings = vec![
        booking("a", "Chapel", t(8, 0), t(9, 30)),
        booking("b", "Chapel", t(10, 0), t(11, 0)),
    ];
    let conflicts = find_conflicts(&occurrences, &bookings);
    let ids: Vec<&str> = conflicts.iter().map(|c| c.booking.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(conflicts[1].overlap_minutes, 60);
}

#[test]
fn find_conflicts_empty_inputs() {
    assert!(find_conflicts(&[], &[]).is_empty());
    assert!(find_conflicts(&[occurrence(t(9, 0), t(10, 0))], &[]).is_empty());
}
