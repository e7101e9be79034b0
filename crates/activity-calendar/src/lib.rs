//! # activity-calendar
//!
//! Calendar core for resident activity scheduling: recurring series expansion,
//! single-occurrence overrides, and room booking conflicts.
//!
//! Every function here is pure. Callers load series, overrides and bookings
//! from storage, pass them in as plain values, and get new values back.
//!
//! ```rust
//! use activity_calendar::{expand, merge, Series};
//!
//! let series: Series = serde_json::from_str(r#"{
//!     "id": "chair-yoga",
//!     "dtstart": "2026-02-02T10:00:00Z",
//!     "durationMin": 60,
//!     "rrule": "FREQ=WEEKLY;INTERVAL=1;BYDAY=MO,WE",
//!     "exdates": ["2026-02-04T10:00:00Z"]
//! }"#).unwrap();
//!
//! let from = "2026-02-01T00:00:00Z".parse().unwrap();
//! let to = "2026-02-10T23:59:59Z".parse().unwrap();
//! let occurrences = merge(&expand(&series, from, to).unwrap(), &[]);
//! assert_eq!(occurrences.len(), 2);
//! ```
//!
//! ## Modules
//!
//! - [`rule`] — repeat-rule string ⇄ [`RepeatRule`]
//! - [`series`] — [`Series`] and [`OccurrenceKey`]
//! - [`expander`] — series → occurrences within a window
//! - [`merge`] — apply occurrence overrides, find orphaned ones
//! - [`conflict`] — half-open overlap and booking conflicts
//! - [`slots`] — open time between bookings
//! - [`error`] — error types

pub mod conflict;
pub mod error;
pub mod expander;
pub mod merge;
pub mod rule;
pub mod series;
pub mod slots;

pub use conflict::{
    find_conflicts, first_conflict, first_conflict_at, first_conflict_excluding, overlaps,
    Conflict, ScheduledInterval,
};
pub use error::{CalendarError, Result};
pub use expander::{expand, expand_all, GeneratedOccurrence};
pub use merge::{find_orphaned_overrides, merge, OccurrenceOverride};
pub use rule::RepeatRule;
pub use series::{OccurrenceKey, Series};
pub use slots::{find_first_open_slot, find_open_slots, OpenSlot};
