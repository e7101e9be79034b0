//! Repeat-rule parsing -- the compact `FREQ=...;INTERVAL=...;BYDAY=...` string
//! stored on a series, turned into a tagged [`RepeatRule`] once per expansion.
//!
//! Only the subset the activity scheduler produces is accepted: daily or weekly
//! frequency, a positive interval, and (weekly only) a list of weekday codes.
//! Anything else is rejected with [`CalendarError::InvalidRule`] instead of
//! falling back to a default.

use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};

/// A parsed repeat rule.
///
/// Deserializing goes through the same checks as [`RepeatRule::daily`] and
/// [`RepeatRule::weekly`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "freq", rename_all = "camelCase", try_from = "RawRepeatRule")]
pub enum RepeatRule {
    /// Every `interval` days.
    Daily { interval: u32 },
    /// Every `interval` weeks on the listed weekdays (Monday first, no
    /// duplicates). An empty list means "the weekday of the series start".
    Weekly { interval: u32, weekdays: Vec<Weekday> },
}

impl RepeatRule {
    /// Build a daily rule, rejecting a zero interval.
    pub fn daily(interval: u32) -> Result<Self> {
        check_interval(interval, || format!("FREQ=DAILY;INTERVAL={interval}"))?;
        Ok(RepeatRule::Daily { interval })
    }

    /// Build a weekly rule. Weekdays are sorted Monday-first and deduplicated.
    pub fn weekly(interval: u32, weekdays: impl IntoIterator<Item = Weekday>) -> Result<Self> {
        check_interval(interval, || format!("FREQ=WEEKLY;INTERVAL={interval}"))?;
        Ok(RepeatRule::Weekly {
            interval,
            weekdays: normalize_weekdays(weekdays),
        })
    }

    pub fn interval(&self) -> u32 {
        match self {
            RepeatRule::Daily { interval } | RepeatRule::Weekly { interval, .. } => *interval,
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "freq", rename_all = "camelCase")]
enum RawRepeatRule {
    Daily { interval: u32 },
    Weekly { interval: u32, weekdays: Vec<Weekday> },
}

impl TryFrom<RawRepeatRule> for RepeatRule {
    type Error = CalendarError;

    fn try_from(raw: RawRepeatRule) -> Result<Self> {
        match raw {
            RawRepeatRule::Daily { interval } => RepeatRule::daily(interval),
            RawRepeatRule::Weekly { interval, weekdays } => RepeatRule::weekly(interval, weekdays),
        }
    }
}

fn check_interval(interval: u32, rule: impl FnOnce() -> String) -> Result<()> {
    if interval == 0 {
        return Err(CalendarError::InvalidRule {
            rule: rule(),
            reason: "INTERVAL must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn normalize_weekdays(weekdays: impl IntoIterator<Item = Weekday>) -> Vec<Weekday> {
    let mut days: Vec<Weekday> = weekdays.into_iter().collect();
    days.sort_by_key(|d| d.num_days_from_monday());
    days.dedup();
    days
}

/// Two-letter iCalendar code for a weekday (`MO`, `TU`, ...).
pub fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

fn parse_weekday_code(code: &str) -> Option<Weekday> {
    match code.to_ascii_uppercase().as_str() {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Frequency {
    Daily,
    Weekly,
}

impl FromStr for RepeatRule {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: String| CalendarError::InvalidRule {
            rule: s.to_string(),
            reason,
        };

        if s.trim().is_empty() {
            return Err(invalid("empty rule".to_string()));
        }

        let mut freq: Option<Frequency> = None;
        let mut interval: Option<u32> = None;
        let mut weekdays: Option<Vec<Weekday>> = None;

        for part in s.split(';') {
            let part = part.trim();
            // A trailing ';' is common in hand-edited rules.
            if part.is_empty() {
                continue;
            }

            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| invalid(format!("expected KEY=VALUE, got '{part}'")))?;
            let key = key.trim().to_ascii_uppercase();
            let value = value.trim();

            match key.as_str() {
                "FREQ" => {
                    if freq.is_some() {
                        return Err(invalid("FREQ given more than once".to_string()));
                    }
                    freq = Some(match value.to_ascii_uppercase().as_str() {
                        "DAILY" => Frequency::Daily,
                        "WEEKLY" => Frequency::Weekly,
                        other => {
                            return Err(invalid(format!(
                                "unsupported FREQ '{other}' (expected DAILY or WEEKLY)"
                            )))
                        }
                    });
                }
                "INTERVAL" => {
                    if interval.is_some() {
                        return Err(invalid("INTERVAL given more than once".to_string()));
                    }
                    let n: u32 = value.parse().map_err(|_| {
                        invalid(format!("INTERVAL '{value}' is not a positive integer"))
                    })?;
                    if n == 0 {
                        return Err(invalid("INTERVAL must be at least 1".to_string()));
                    }
                    interval = Some(n);
                }
                "BYDAY" => {
                    if weekdays.is_some() {
                        return Err(invalid("BYDAY given more than once".to_string()));
                    }
                    let mut days = Vec::new();
                    for code in value.split(',') {
                        let code = code.trim();
                        let day = parse_weekday_code(code)
                            .ok_or_else(|| invalid(format!("unknown weekday code '{code}'")))?;
                        days.push(day);
                    }
                    weekdays = Some(days);
                }
                other => return Err(invalid(format!("unsupported rule part '{other}'"))),
            }
        }

        let freq = freq.ok_or_else(|| invalid("missing FREQ".to_string()))?;
        let interval = interval.unwrap_or(1);

        match freq {
            Frequency::Daily => {
                if weekdays.is_some() {
                    return Err(invalid("BYDAY is only valid with FREQ=WEEKLY".to_string()));
                }
                Ok(RepeatRule::Daily { interval })
            }
            Frequency::Weekly => Ok(RepeatRule::Weekly {
                interval,
                weekdays: normalize_weekdays(weekdays.unwrap_or_default()),
            }),
        }
    }
}

impl fmt::Display for RepeatRule {
    /// Canonical form, e.g. `FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepeatRule::Daily { interval } => write!(f, "FREQ=DAILY;INTERVAL={interval}"),
            RepeatRule::Weekly { interval, weekdays } => {
                write!(f, "FREQ=WEEKLY;INTERVAL={interval}")?;
                if !weekdays.is_empty() {
                    let codes: Vec<&str> = weekdays.iter().map(|d| weekday_code(*d)).collect();
                    write!(f, ";BYDAY={}", codes.join(","))?;
                }
                Ok(())
            }
        }
    }
}
