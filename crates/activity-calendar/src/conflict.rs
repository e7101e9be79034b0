//! Detect booking conflicts.
//!
//! Intervals are half-open `[start, end)`: an activity ending at 11:00 and one
//! starting at 11:00 in the same room do NOT conflict.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::expander::GeneratedOccurrence;

/// An already committed activity instance occupying a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledInterval {
    pub id: String,
    pub location: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

/// A generated occurrence that collides with an existing booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub occurrence: GeneratedOccurrence,
    pub booking: ScheduledInterval,
    pub overlap_minutes: i64,
}

/// Whether `[a_start, a_end)` and `[b_start, b_end)` share any instant.
///
/// Symmetric in its two intervals. Callers must pass `start < end` for both;
/// degenerate intervals are not checked.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// First booking in `existing` overlapping `[start, end)`, in input order.
pub fn first_conflict<'a>(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    existing: impl IntoIterator<Item = &'a ScheduledInterval>,
) -> Option<&'a ScheduledInterval> {
    existing
        .into_iter()
        .find(|b| overlaps(start, end, b.start_at, b.end_at))
}

/// First booking at `location` overlapping `[start, end)`.
///
/// Locations compare by exact string equality.
pub fn first_conflict_at<'a>(
    location: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    existing: &'a [ScheduledInterval],
) -> Option<&'a ScheduledInterval> {
    first_conflict(start, end, existing.iter().filter(|b| b.location == location))
}

/// Like [`first_conflict_at`], ignoring the booking with id `except_id`.
///
/// Used when moving an activity: its current booking must not block its new time.
pub fn first_conflict_excluding<'a>(
    location: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    except_id: &str,
    existing: &'a [ScheduledInterval],
) -> Option<&'a ScheduledInterval> {
    first_conflict(
        start,
        end,
        existing
            .iter()
            .filter(|b| b.location == location && b.id != except_id),
    )
}

/// Find every pairwise conflict between occurrences and bookings.
///
/// Results are ordered by occurrence, then by booking, as given. The overlap is
/// `min(ends) - max(starts)` in whole minutes. Location is not considered; pass
/// the bookings of the room being checked.
pub fn find_conflicts(
    occurrences: &[GeneratedOccurrence],
    bookings: &[ScheduledInterval],
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for occ in occurrences {
        for booking in bookings {
            if overlaps(occ.start_at, occ.end_at, booking.start_at, booking.end_at) {
                let overlap_start = occ.start_at.max(booking.start_at);
                let overlap_end = occ.end_at.min(booking.end_at);

                conflicts.push(Conflict {
                    occurrence: occ.clone(),
                    booking: booking.clone(),
                    overlap_minutes: (overlap_end - overlap_start).num_minutes(),
                });
            }
        }
    }

    conflicts
}
