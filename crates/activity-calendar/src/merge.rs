//! Overlay single-occurrence edits onto generated occurrences.
//!
//! An override moves one slot of a series (new start/end) without detaching it
//! from the series. It is matched to its slot by `(series_id, occurrence_key)`,
//! where the key comes from the slot's *original* start.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::expander::{expand, GeneratedOccurrence};
use crate::series::{OccurrenceKey, Series};

/// A persisted edit to one occurrence of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceOverride {
    pub series_id: String,
    pub occurrence_key: OccurrenceKey,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

/// Apply overrides to generated occurrences.
///
/// Each occurrence with a matching override takes the override's start and end;
/// its key and series id are kept. The output has the same length, keys and
/// order as `generated`, even when an override moves a slot past its neighbours.
///
/// Overrides that match nothing (typically slots outside the expanded window)
/// are ignored. If two overrides target the same slot the later one wins.
pub fn merge(
    generated: &[GeneratedOccurrence],
    overrides: &[OccurrenceOverride],
) -> Vec<GeneratedOccurrence> {
    let mut by_slot: HashMap<(&str, &OccurrenceKey), &OccurrenceOverride> =
        HashMap::with_capacity(overrides.len());
    for ov in overrides {
        if by_slot
            .insert((ov.series_id.as_str(), &ov.occurrence_key), ov)
            .is_some()
        {
            warn!(
                series_id = %ov.series_id,
                occurrence_key = %ov.occurrence_key,
                "duplicate override for occurrence; using the last one"
            );
        }
    }

    let mut applied = 0usize;
    let merged: Vec<GeneratedOccurrence> = generated
        .iter()
        .map(|occ| {
            match by_slot.get(&(occ.series_id.as_str(), &occ.occurrence_key)) {
                Some(ov) => {
                    applied += 1;
                    GeneratedOccurrence {
                        start_at: ov.start_at,
                        end_at: ov.end_at,
                        ..occ.clone()
                    }
                }
                None => occ.clone(),
            }
        })
        .collect();

    debug!(
        occurrences = merged.len(),
        applied,
        unmatched = by_slot.len().saturating_sub(applied),
        "merged occurrence overrides"
    );

    merged
}

/// Overrides of `series` that no longer point at a slot the series generates.
///
/// A slot is valid when its key parses as an instant that the series' rule
/// produces, not later than `until` and not excluded. This catches overrides
/// left behind after the series was rescheduled or the slot was skipped;
/// [`merge`] drops those silently. Overrides of other series are not examined.
///
/// # Errors
/// Propagates rule and duration errors from expanding `series`.
pub fn find_orphaned_overrides<'a>(
    series: &Series,
    overrides: &'a [OccurrenceOverride],
) -> Result<Vec<&'a OccurrenceOverride>> {
    let mut orphans = Vec::new();
    for ov in overrides.iter().filter(|ov| ov.series_id == series.id) {
        let valid = match ov.occurrence_key.original_start() {
            // Keys are truncated to the millisecond, so the slot may start
            // anywhere inside that millisecond.
            Ok(start) => expand(series, start, start + Duration::nanoseconds(999_999))?
                .iter()
                .any(|occ| occ.occurrence_key == ov.occurrence_key),
            Err(_) => false,
        };
        if !valid {
            orphans.push(ov);
        }
    }
    Ok(orphans)
}
