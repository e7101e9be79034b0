//! Series definitions and occurrence keys.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};
use crate::rule::RepeatRule;

/// A recurring activity as stored by the application.
///
/// `until` is an inclusive bound on occurrence start times; without it the
/// series is bounded only by the window passed to [`crate::expand`].
/// `exdates` are compared to occurrence starts as instants, so any RFC 3339
/// rendering of the same instant excludes the same occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub id: String,
    pub dtstart: DateTime<Utc>,
    pub duration_min: u32,
    pub rrule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exdates: BTreeSet<DateTime<Utc>>,
}

impl Series {
    /// Parse the stored rule string.
    pub fn rule(&self) -> Result<RepeatRule> {
        self.rrule.parse()
    }

    /// Length of every occurrence. Errors when `duration_min` is zero.
    pub fn duration(&self) -> Result<Duration> {
        if self.duration_min == 0 {
            return Err(CalendarError::InvalidSeries {
                id: self.id.clone(),
                reason: "duration must be a positive number of minutes".to_string(),
            });
        }
        Ok(Duration::minutes(i64::from(self.duration_min)))
    }

    pub fn is_excluded(&self, start: DateTime<Utc>) -> bool {
        self.exdates.contains(&start)
    }
}

/// Stable identifier of one slot in a series, derived only from the slot's
/// original start. Rendered as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
///
/// Keys read from storage are normalized to that form when they parse as an
/// RFC 3339 instant; anything else is kept verbatim and simply never matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct OccurrenceKey(String);

impl OccurrenceKey {
    /// Sub-millisecond precision is truncated.
    pub fn from_start(start: DateTime<Utc>) -> Self {
        OccurrenceKey(start.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recover the original start instant this key was derived from.
    pub fn original_start(&self) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.0)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| CalendarError::InvalidOccurrenceKey(format!("'{}': {}", self.0, e)))
    }
}

impl From<String> for OccurrenceKey {
    fn from(raw: String) -> Self {
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(dt) => OccurrenceKey::from_start(dt.with_timezone(&Utc)),
            Err(_) => OccurrenceKey(raw),
        }
    }
}

impl From<&str> for OccurrenceKey {
    fn from(raw: &str) -> Self {
        OccurrenceKey::from(raw.to_string())
    }
}

impl From<OccurrenceKey> for String {
    fn from(key: OccurrenceKey) -> Self {
        key.0
    }
}

impl fmt::Display for OccurrenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
