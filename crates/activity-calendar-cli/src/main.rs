//! `actcal`: expand recurring activities and check room bookings from the
//! command line. All input and output is JSON with RFC 3339 UTC timestamps.
//!
//! ## Usage
//!
//! ```sh
//! # Occurrences of one or more series in an explicit window
//! actcal expand --series series.json --from 2026-02-01T00:00:00Z --to 2026-02-10T23:59:59Z
//!
//! # Same, with overrides applied, for one local week in the community's zone
//! actcal expand --series series.json --overrides overrides.json \
//!   --date 2026-02-02 --days 7 --tz America/Chicago
//!
//! # Would 10:00-11:00 in the Chapel collide with an existing booking?
//! actcal check --existing bookings.json --location Chapel \
//!   --start 2026-03-02T10:00:00Z --end 2026-03-02T11:00:00Z
//!
//! # Open time in the Chapel on a local day, at least 45 minutes long
//! actcal slots --existing bookings.json --location Chapel \
//!   --date 2026-03-02 --tz America/Chicago --min-minutes 45
//!
//! # Validate and normalize a repeat rule
//! actcal rule "byday=we,mo;freq=weekly"
//!
//! # Overrides that no longer point at a slot of their series
//! actcal orphans --series series.json --overrides overrides.json
//! ```
//!
//! Set `ACTCAL_LOG` (e.g. `ACTCAL_LOG=debug`) or pass `-v` for diagnostics on stderr.

use std::io::{self, Read};

use activity_calendar::{
    expand_all, find_open_slots, find_orphaned_overrides, first_conflict_at,
    first_conflict_excluding, merge, OccurrenceOverride, RepeatRule, ScheduledInterval, Series,
};
use anyhow::{anyhow, bail, Context, Result};
use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "actcal",
    version,
    about = "Resident activity calendar: expand series, apply overrides, check room bookings"
)]
struct Cli {
    /// Print debug diagnostics to stderr (overrides ACTCAL_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand series into occurrences, optionally applying overrides
    Expand {
        /// Series JSON file, one object or an array (reads from stdin if omitted)
        #[arg(long)]
        series: Option<String>,
        /// Occurrence overrides JSON file (array)
        #[arg(long)]
        overrides: Option<String>,
        #[command(flatten)]
        window: WindowArgs,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Check a proposed time against existing bookings at a location
    Check {
        /// Bookings JSON file (reads from stdin if omitted)
        #[arg(long)]
        existing: Option<String>,
        #[arg(long)]
        location: String,
        /// Proposed start, RFC 3339
        #[arg(long)]
        start: String,
        /// Proposed end, RFC 3339
        #[arg(long)]
        end: String,
        /// Id of the booking being moved; it does not count as a conflict
        #[arg(long)]
        except: Option<String>,
    },
    /// List open time between bookings at a location
    Slots {
        /// Bookings JSON file (reads from stdin if omitted)
        #[arg(long)]
        existing: Option<String>,
        #[arg(long)]
        location: String,
        #[command(flatten)]
        window: WindowArgs,
        /// Only report slots at least this many minutes long
        #[arg(long)]
        min_minutes: Option<i64>,
    },
    /// Parse a repeat rule and print its canonical form
    Rule {
        /// Rule string, e.g. "FREQ=WEEKLY;INTERVAL=1;BYDAY=MO,WE"
        rule: String,
    },
    /// List overrides that do not match any slot of their series
    Orphans {
        /// Series JSON file, one object or an array
        #[arg(long)]
        series: String,
        /// Occurrence overrides JSON file (array)
        #[arg(long)]
        overrides: String,
    },
}

/// Query window: either explicit instants or whole local days in a zone.
#[derive(Args)]
struct WindowArgs {
    /// Window start, RFC 3339 (e.g. 2026-02-01T00:00:00Z)
    #[arg(long)]
    from: Option<String>,
    /// Window end, RFC 3339
    #[arg(long)]
    to: Option<String>,
    /// First local calendar day of the window (YYYY-MM-DD); needs --tz
    #[arg(long)]
    date: Option<String>,
    /// Number of local days starting at --date [default: 1]
    #[arg(long)]
    days: Option<u32>,
    /// IANA time zone for --date (e.g. America/Chicago)
    #[arg(long)]
    tz: Option<String>,
}

impl WindowArgs {
    /// Resolve to `[start, end)` in UTC. With `--date`, `end` is the local
    /// midnight after the last day.
    fn resolve(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        match (&self.from, &self.to, &self.date) {
            (Some(from), Some(to), None) => {
                if self.days.is_some() || self.tz.is_some() {
                    bail!("--days and --tz only apply with --date");
                }
                Ok((parse_instant(from)?, parse_instant(to)?))
            }
            (None, None, Some(date)) => {
                let tz_name = self
                    .tz
                    .as_deref()
                    .ok_or_else(|| anyhow!("--date requires --tz"))?;
                local_days(date, self.days.unwrap_or(1), tz_name)
            }
            _ => bail!("Give either --from and --to, or --date with --tz"),
        }
    }

    /// Like [`WindowArgs::resolve`], but a `--date` window ends one second
    /// before the next local midnight so that an activity starting at
    /// midnight belongs to the following day.
    fn resolve_inclusive(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let (start, end) = self.resolve()?;
        if self.date.is_some() {
            Ok((start, end - Duration::seconds(1)))
        } else {
            Ok((start, end))
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Expand {
            series,
            overrides,
            window,
            output,
        } => {
            let series: Vec<Series> = read_json::<OneOrMany<Series>>(series.as_deref())
                .context("Failed to load series")?
                .into_vec();
            let overrides: Vec<OccurrenceOverride> = match overrides.as_deref() {
                Some(path) => read_json(Some(path)).context("Failed to load overrides")?,
                None => Vec::new(),
            };
            let (from, to) = window.resolve_inclusive()?;
            debug!(series = series.len(), %from, %to, "expanding");

            let generated =
                expand_all(&series, from, to).context("Failed to expand series")?;
            let merged = merge(&generated, &overrides);

            write_output(output.as_deref(), &serde_json::to_string_pretty(&merged)?)?;
        }
        Commands::Check {
            existing,
            location,
            start,
            end,
            except,
        } => {
            let bookings: Vec<ScheduledInterval> =
                read_json(existing.as_deref()).context("Failed to load bookings")?;
            let start = parse_instant(&start)?;
            let end = parse_instant(&end)?;
            if end <= start {
                bail!("--end must be after --start");
            }

            let hit = match except.as_deref() {
                Some(id) => first_conflict_excluding(&location, start, end, id, &bookings),
                None => first_conflict_at(&location, start, end, &bookings),
            };
            let report = json!({ "conflict": hit.is_some(), "with": hit });
            write_output(None, &serde_json::to_string_pretty(&report)?)?;
        }
        Commands::Slots {
            existing,
            location,
            window,
            min_minutes,
        } => {
            let bookings: Vec<ScheduledInterval> =
                read_json(existing.as_deref()).context("Failed to load bookings")?;
            let here: Vec<ScheduledInterval> = bookings
                .into_iter()
                .filter(|b| b.location == location)
                .collect();
            let (from, to) = window.resolve()?;

            let min = min_minutes.unwrap_or(0);
            let slots: Vec<_> = find_open_slots(&here, from, to)
                .into_iter()
                .filter(|s| s.duration_minutes >= min)
                .collect();
            write_output(None, &serde_json::to_string_pretty(&slots)?)?;
        }
        Commands::Rule { rule } => {
            let parsed: RepeatRule = rule.parse()?;
            let report = json!({ "rule": parsed.to_string(), "parsed": parsed });
            write_output(None, &serde_json::to_string_pretty(&report)?)?;
        }
        Commands::Orphans { series, overrides } => {
            let series: Vec<Series> = read_json::<OneOrMany<Series>>(Some(&series))
                .context("Failed to load series")?
                .into_vec();
            let overrides: Vec<OccurrenceOverride> =
                read_json(Some(&overrides)).context("Failed to load overrides")?;

            let mut orphans = Vec::new();
            for s in &series {
                orphans.extend(
                    find_orphaned_overrides(s, &overrides)
                        .with_context(|| format!("Failed to check series '{}'", s.id))?,
                );
            }
            // Overrides whose series is not in the file at all are orphans too.
            orphans.extend(
                overrides
                    .iter()
                    .filter(|ov| series.iter().all(|s| s.id != ov.series_id)),
            );
            write_output(None, &serde_json::to_string_pretty(&orphans)?)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("ACTCAL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Parse an RFC 3339 timestamp, or a naive `YYYY-MM-DDTHH:MM:SS` taken as UTC.
fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .with_context(|| format!("Invalid timestamp '{}'", s))
}

/// UTC bounds of `days` local calendar days starting at `date` in zone `tz_name`.
fn local_days(date: &str, days: u32, tz_name: &str) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    if days == 0 {
        bail!("--days must be at least 1");
    }
    let tz: Tz = tz_name
        .parse()
        .map_err(|e| anyhow!("Unknown time zone '{}': {}", tz_name, e))?;
    let first = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}' (expected YYYY-MM-DD)", date))?;
    let last = first
        .checked_add_days(chrono::Days::new(u64::from(days)))
        .ok_or_else(|| anyhow!("Date range out of bounds"))?;

    Ok((local_midnight(first, &tz), local_midnight(last, &tz)))
}

/// First instant of `date` in `tz`. When the clocks skip midnight (Chile moves
/// them at 24:00) the day starts where the gap ends.
fn local_midnight(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => {
            // Midnight read with the offset in force before the gap is the
            // transition instant itself.
            let before = tz
                .offset_from_utc_datetime(&(midnight - Duration::days(1)))
                .fix();
            (midnight - Duration::seconds(i64::from(before.local_minus_utc()))).and_utc()
        }
    }
}

fn read_json<T: DeserializeOwned>(path: Option<&str>) -> Result<T> {
    let text = read_input(path)?;
    serde_json::from_str(&text).with_context(|| match path {
        Some(path) => format!("Invalid JSON in {}", path),
        None => "Invalid JSON on stdin".to_string(),
    })
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
