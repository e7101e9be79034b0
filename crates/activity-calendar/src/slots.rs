//! Open time at a location.
//!
//! Bookings are clipped to the window, overlapping or touching ones are merged,
//! and the gaps between them are returned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::ScheduledInterval;

/// A gap between bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSlot {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub duration_minutes: i64,
}

impl OpenSlot {
    fn new(start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Self {
        OpenSlot {
            start_at,
            end_at,
            duration_minutes: (end_at - start_at).num_minutes(),
        }
    }
}

/// Merge overlapping or adjacent bookings, clipped to the given window.
fn merge_busy_periods(
    bookings: &[ScheduledInterval],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut intervals: Vec<(DateTime<Utc>, DateTime<Utc>)> = bookings
        .iter()
        .filter(|b| b.start_at < window_end && b.end_at > window_start)
        .map(|b| (b.start_at.max(window_start), b.end_at.min(window_end)))
        .collect();

    intervals.sort_unstable();

    let mut merged: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::with_capacity(intervals.len());
    for (start, end) in intervals {
        if let Some(last) = merged.last_mut() {
            if start <= last.1 {
                last.1 = last.1.max(end);
                continue;
            }
        }
        merged.push((start, end));
    }

    merged
}

/// Gaps between `bookings` inside `[window_start, window_end)`, in order.
///
/// Bookings may overlap each other. An inverted or empty window yields no
/// slots.
pub fn find_open_slots(
    bookings: &[ScheduledInterval],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<OpenSlot> {
    if window_start >= window_end {
        return Vec::new();
    }

    let mut slots = Vec::new();
    let mut cursor = window_start;

    for (busy_start, busy_end) in merge_busy_periods(bookings, window_start, window_end) {
        if cursor < busy_start {
            slots.push(OpenSlot::new(cursor, busy_start));
        }
        cursor = cursor.max(busy_end);
    }

    if cursor < window_end {
        slots.push(OpenSlot::new(cursor, window_end));
    }

    slots
}

/// The first gap of at least `min_minutes` within the window.
pub fn find_first_open_slot(
    bookings: &[ScheduledInterval],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    min_minutes: i64,
) -> Option<OpenSlot> {
    find_open_slots(bookings, window_start, window_end)
        .into_iter()
        .find(|slot| slot.duration_minutes >= min_minutes)
}
