//! WASM bindings for activity-calendar.
//!
//! Exposes series expansion, override merging, conflict checks and open-slot
//! search to the web application's JavaScript routes via `wasm-bindgen`. All
//! complex values cross the boundary as JSON strings using the same camelCase
//! field names as the application's records; timestamps are ISO 8601 strings.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p activity-calendar-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target nodejs --out-dir packages/activity-calendar-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/activity_calendar_wasm.wasm
//! ```

use activity_calendar::{
    expand_all, find_conflicts as core_find_conflicts, find_open_slots as core_find_open_slots,
    first_conflict_at, first_conflict_excluding, merge, GeneratedOccurrence, OccurrenceOverride,
    RepeatRule, ScheduledInterval, Series,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Helpers: JSON and datetime parsing with string errors
// ---------------------------------------------------------------------------

/// Parse an ISO 8601 datetime string into `DateTime<Utc>`.
///
/// Accepts RFC 3339 (e.g. "2026-02-02T10:00:00Z") and naive time
/// (e.g. "2026-02-02T10:00:00"), which is interpreted as UTC.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| format!("Invalid datetime '{}': {}", s, e))
}

fn parse_json<T: DeserializeOwned>(what: &str, json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {} JSON: {}", what, e))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

fn js_err(message: String) -> JsValue {
    JsValue::from_str(&message)
}

// ---------------------------------------------------------------------------
// Implementations (plain Rust, testable off-wasm)
// ---------------------------------------------------------------------------

fn expand_series_json(
    series_json: &str,
    range_start: &str,
    range_end: &str,
    overrides_json: Option<&str>,
) -> Result<String, String> {
    let series: Vec<Series> = parse_json("series", series_json)?;
    let overrides: Vec<OccurrenceOverride> = match overrides_json {
        Some(json) => parse_json("overrides", json)?,
        None => Vec::new(),
    };
    let start = parse_datetime(range_start)?;
    let end = parse_datetime(range_end)?;

    let generated = expand_all(&series, start, end).map_err(|e| e.to_string())?;
    to_json(&merge(&generated, &overrides))
}

fn merge_overrides_json(occurrences_json: &str, overrides_json: &str) -> Result<String, String> {
    let occurrences: Vec<GeneratedOccurrence> = parse_json("occurrences", occurrences_json)?;
    let overrides: Vec<OccurrenceOverride> = parse_json("overrides", overrides_json)?;
    to_json(&merge(&occurrences, &overrides))
}

fn find_conflict_json(
    location: &str,
    start: &str,
    end: &str,
    bookings_json: &str,
    except_id: Option<&str>,
) -> Result<String, String> {
    let bookings: Vec<ScheduledInterval> = parse_json("bookings", bookings_json)?;
    let start = parse_datetime(start)?;
    let end = parse_datetime(end)?;

    let hit = match except_id {
        Some(id) => first_conflict_excluding(location, start, end, id, &bookings),
        None => first_conflict_at(location, start, end, &bookings),
    };
    to_json(&serde_json::json!({ "conflict": hit.is_some(), "with": hit }))
}

fn find_conflicts_json(occurrences_json: &str, bookings_json: &str) -> Result<String, String> {
    let occurrences: Vec<GeneratedOccurrence> = parse_json("occurrences", occurrences_json)?;
    let bookings: Vec<ScheduledInterval> = parse_json("bookings", bookings_json)?;
    to_json(&core_find_conflicts(&occurrences, &bookings))
}

fn find_open_slots_json(
    bookings_json: &str,
    window_start: &str,
    window_end: &str,
) -> Result<String, String> {
    let bookings: Vec<ScheduledInterval> = parse_json("bookings", bookings_json)?;
    let ws = parse_datetime(window_start)?;
    let we = parse_datetime(window_end)?;
    to_json(&core_find_open_slots(&bookings, ws, we))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Expand a JSON array of series over `[rangeStart, rangeEnd]` and apply the
/// optional JSON array of overrides.
///
/// Returns a JSON array of `{seriesId, occurrenceKey, startAt, endAt}` sorted
/// by original start.
#[wasm_bindgen(js_name = "expandSeries")]
pub fn expand_series(
    series_json: &str,
    range_start: &str,
    range_end: &str,
    overrides_json: Option<String>,
) -> Result<String, JsValue> {
    expand_series_json(series_json, range_start, range_end, overrides_json.as_deref())
        .map_err(js_err)
}

/// Apply overrides to already generated occurrences. Order and keys are kept.
#[wasm_bindgen(js_name = "mergeOverrides")]
pub fn merge_overrides(occurrences_json: &str, overrides_json: &str) -> Result<String, JsValue> {
    merge_overrides_json(occurrences_json, overrides_json).map_err(js_err)
}

/// Half-open overlap test between `[aStart, aEnd)` and `[bStart, bEnd)`.
#[wasm_bindgen]
pub fn overlaps(a_start: &str, a_end: &str, b_start: &str, b_end: &str) -> Result<bool, JsValue> {
    Ok(activity_calendar::overlaps(
        parse_datetime(a_start).map_err(js_err)?,
        parse_datetime(a_end).map_err(js_err)?,
        parse_datetime(b_start).map_err(js_err)?,
        parse_datetime(b_end).map_err(js_err)?,
    ))
}

/// Check a proposed `[start, end)` at `location` against a JSON array of
/// bookings. Returns `{conflict, with}` where `with` is the first clashing
/// booking or `null`. `exceptId` names a booking being moved.
#[wasm_bindgen(js_name = "findConflict")]
pub fn find_conflict(
    location: &str,
    start: &str,
    end: &str,
    bookings_json: &str,
    except_id: Option<String>,
) -> Result<String, JsValue> {
    find_conflict_json(location, start, end, bookings_json, except_id.as_deref()).map_err(js_err)
}

/// Every overlapping (occurrence, booking) pair with its overlap in minutes.
#[wasm_bindgen(js_name = "findConflicts")]
pub fn find_conflicts(occurrences_json: &str, bookings_json: &str) -> Result<String, JsValue> {
    find_conflicts_json(occurrences_json, bookings_json).map_err(js_err)
}

/// Gaps between bookings inside `[windowStart, windowEnd)` as a JSON array of
/// `{startAt, endAt, durationMinutes}`.
#[wasm_bindgen(js_name = "findOpenSlots")]
pub fn find_open_slots(
    bookings_json: &str,
    window_start: &str,
    window_end: &str,
) -> Result<String, JsValue> {
    find_open_slots_json(bookings_json, window_start, window_end).map_err(js_err)
}

/// Validate a repeat rule and return its canonical string.
#[wasm_bindgen(js_name = "normalizeRule")]
pub fn normalize_rule(rule: &str) -> Result<String, JsValue> {
    rule.parse::<RepeatRule>()
        .map(|r| r.to_string())
        .map_err(|e| js_err(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const SERIES: &str = r#"[{
        "id": "exercise",
        "dtstart": "2026-02-02T10:00:00Z",
        "durationMin": 60,
        "rrule": "FREQ=WEEKLY;INTERVAL=1;BYDAY=MO,WE",
        "exdates": ["2026-02-04T10:00:00Z"]
    }]"#;

    #[test]
    fn expand_series_applies_exdates_and_overrides() {
        let overrides = r#"[{"seriesId":"exercise","occurrenceKey":"2026-02-09T10:00:00.000Z",
            "startAt":"2026-02-09T13:00:00Z","endAt":"2026-02-09T14:00:00Z"}]"#;
        let out = expand_series_json(
            SERIES,
            "2026-02-01T00:00:00Z",
            "2026-02-10T23:59:59Z",
            Some(overrides),
        )
        .unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        let list = value.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["startAt"], "2026-02-02T10:00:00Z");
        assert_eq!(list[1]["occurrenceKey"], "2026-02-09T10:00:00.000Z");
        assert_eq!(list[1]["startAt"], "2026-02-09T13:00:00Z");
    }

    #[test]
    fn normalize_rule_returns_canonical_form() {
        assert_eq!(
            normalize_rule("byday=we,mo;freq=weekly").unwrap(),
            "FREQ=WEEKLY;INTERVAL=1;BYDAY=MO,WE"
        );
    }

    #[test]
    fn naive_range_bounds_are_utc() {
        let out = expand_series_json(SERIES, "2026-02-02T00:00:00", "2026-02-02T23:00:00", None)
            .unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
    }

    #[test]
    fn bad_inputs_report_messages() {
        let err = expand_series_json("{", "2026-02-01T00:00:00Z", "2026-02-02T00:00:00Z", None)
            .unwrap_err();
        assert!(err.starts_with("Invalid series JSON"), "got: {err}");

        let err =
            expand_series_json(SERIES, "yesterday", "2026-02-02T00:00:00Z", None).unwrap_err();
        assert!(err.contains("yesterday"), "got: {err}");
    }

    #[test]
    fn find_conflict_reports_first_booking() {
        let bookings = r#"[
            {"id":"a","location":"Chapel","startAt":"2026-03-02T09:00:00Z","endAt":"2026-03-02T10:00:00Z"},
            {"id":"b","location":"Chapel","startAt":"2026-03-02T10:30:00Z","endAt":"2026-03-02T11:30:00Z"}
        ]"#;
        let out = find_conflict_json(
            "Chapel",
            "2026-03-02T10:00:00Z",
            "2026-03-02T11:00:00Z",
            bookings,
            None,
        )
        .unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["conflict"], true);
        assert_eq!(value["with"]["id"], "b");

        let out = find_conflict_json(
            "Chapel",
            "2026-03-02T10:00:00Z",
            "2026-03-02T11:00:00Z",
            bookings,
            Some("b"),
        )
        .unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["conflict"], false);
    }

    #[test]
    fn open_slots_and_conflicts_serialize() {
        let bookings = r#"[{"id":"a","location":"Chapel","startAt":"2026-03-02T09:00:00Z","endAt":"2026-03-02T10:00:00Z"}]"#;
        let slots = find_open_slots_json(bookings, "2026-03-02T08:00:00Z", "2026-03-02T12:00:00Z")
            .unwrap();
        let value: Value = serde_json::from_str(&slots).unwrap();
        assert_eq!(value[0]["durationMinutes"], 60);
        assert_eq!(value[1]["durationMinutes"], 120);

        let occurrences = r#"[{"seriesId":"s","occurrenceKey":"2026-03-02T09:30:00.000Z",
            "startAt":"2026-03-02T09:30:00Z","endAt":"2026-03-02T10:30:00Z"}]"#;
        let conflicts = find_conflicts_json(occurrences, bookings).unwrap();
        let value: Value = serde_json::from_str(&conflicts).unwrap();
        assert_eq!(value[0]["overlapMinutes"], 30);

        let merged = merge_overrides_json(occurrences, "[]").unwrap();
        let value: Value = serde_json::from_str(&merged).unwrap();
        assert_eq!(value[0]["startAt"], "2026-03-02T09:30:00Z");
    }
}
