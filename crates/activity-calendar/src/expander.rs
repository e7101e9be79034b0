//! Series expansion -- turns a [`Series`] into the concrete occurrences that
//! start inside a query window.
//!
//! All arithmetic is on UTC instants. Day and week boundaries in a resident
//! community's local zone are the caller's job; the window passed in here is
//! already absolute.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::rule::RepeatRule;
use crate::series::{OccurrenceKey, Series};

/// One concrete instance of a series. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedOccurrence {
    pub series_id: String,
    pub occurrence_key: OccurrenceKey,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

/// Expand a series into the occurrences whose start falls in
/// `[range_start, range_end]`.
///
/// An occurrence that starts inside the window is returned even when it ends
/// after `range_end`. `series.until` further caps the start (inclusive), and a
/// start listed in `series.exdates` is dropped entirely.
///
/// Weekly rules walk blocks of `7 * interval` days anchored on the Monday of
/// the week containing `dtstart`, emitting the listed weekdays of each block in
/// order at `dtstart`'s time of day. Weekdays of the first block that fall
/// before `dtstart` are not emitted.
///
/// The result is sorted by start and has no duplicate keys.
///
/// # Errors
/// Returns `CalendarError::InvalidRule` if `series.rrule` does not parse, and
/// `CalendarError::InvalidSeries` if `series.duration_min` is zero.
pub fn expand(
    series: &Series,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> Result<Vec<GeneratedOccurrence>> {
    let rule = series.rule()?;
    let duration = series.duration()?;

    if range_start > range_end || series.dtstart > range_end {
        return Ok(Vec::new());
    }

    let limit = match series.until {
        Some(until) => until.min(range_end),
        None => range_end,
    };

    let mut occurrences = Vec::new();
    for start in candidate_starts(&rule, series.dtstart, range_start) {
        if start > limit {
            break;
        }
        if start < range_start || series.is_excluded(start) {
            continue;
        }
        occurrences.push(GeneratedOccurrence {
            series_id: series.id.clone(),
            occurrence_key: OccurrenceKey::from_start(start),
            start_at: start,
            end_at: start + duration,
        });
    }

    debug!(
        series_id = %series.id,
        rule = %rule,
        count = occurrences.len(),
        "expanded series"
    );

    Ok(occurrences)
}

/// Expand several series over the same window, sorted by start then series id.
///
/// Stops at the first series that fails to expand.
pub fn expand_all<'a>(
    series: impl IntoIterator<Item = &'a Series>,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> Result<Vec<GeneratedOccurrence>> {
    let mut all = Vec::new();
    for s in series {
        all.extend(expand(s, range_start, range_end)?);
    }
    all.sort_by(|a, b| {
        a.start_at
            .cmp(&b.start_at)
            .then_with(|| a.series_id.cmp(&b.series_id))
    });
    Ok(all)
}

/// Unbounded, chronological stream of rule dates at or after `dtstart`.
///
/// Blocks that lie entirely before `range_start`'s calendar day are skipped
/// without being generated; every date they hold is earlier than the window.
fn candidate_starts(
    rule: &RepeatRule,
    dtstart: DateTime<Utc>,
    range_start: DateTime<Utc>,
) -> impl Iterator<Item = DateTime<Utc>> {
    let (anchor, period, offsets) = match rule {
        RepeatRule::Daily { interval } => (dtstart, i64::from(*interval), vec![0i64]),
        RepeatRule::Weekly { interval, weekdays } => {
            let from_monday = i64::from(dtstart.weekday().num_days_from_monday());
            let offsets: Vec<i64> = if weekdays.is_empty() {
                vec![from_monday]
            } else {
                weekdays
                    .iter()
                    .map(|d| i64::from(d.num_days_from_monday()))
                    .collect()
            };
            (
                dtstart - Duration::days(from_monday),
                7 * i64::from(*interval),
                offsets,
            )
        }
    };

    let mut block = if range_start > anchor {
        (range_start.date_naive() - anchor.date_naive()).num_days() / period
    } else {
        0
    };
    let mut idx = 0;

    std::iter::from_fn(move || loop {
        if idx == offsets.len() {
            idx = 0;
            block += 1;
        }
        let days = block.checked_mul(period)?.checked_add(offsets[idx])?;
        idx += 1;
        let candidate = anchor.checked_add_signed(Duration::try_days(days)?)?;
        if candidate >= dtstart {
            return Some(candidate);
        }
    })
}
