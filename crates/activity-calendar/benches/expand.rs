use std::collections::BTreeSet;
use std::hint::black_box;

use activity_calendar::{
    expand, find_conflicts, merge, OccurrenceOverride, ScheduledInterval, Series,
};
use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};

fn weekday_series() -> Series {
    Series {
        id: "exercise".to_string(),
        dtstart: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
        duration_min: 60,
        rrule: "FREQ=WEEKLY;INTERVAL=1;BYDAY=MO,TU,WE,TH,FR".to_string(),
        until: None,
        exdates: BTreeSet::new(),
    }
}

fn bench_expand(c: &mut Criterion) {
    let series = weekday_series();
    let from = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap();

    c.bench_function("expand_weekdays_one_year", |b| {
        b.iter(|| expand(black_box(&series), black_box(from), black_box(to)).unwrap())
    });

    let generated = expand(&series, from, to).unwrap();
    let overrides: Vec<OccurrenceOverride> = generated
        .iter()
        .step_by(10)
        .map(|o| OccurrenceOverride {
            series_id: o.series_id.clone(),
            occurrence_key: o.occurrence_key.clone(),
            start_at: o.start_at + Duration::hours(2),
            end_at: o.end_at + Duration::hours(2),
        })
        .collect();

    c.bench_function("merge_one_year", |b| {
        b.iter(|| merge(black_box(&generated), black_box(&overrides)))
    });

    let bookings: Vec<ScheduledInterval> = generated
        .iter()
        .step_by(3)
        .map(|o| ScheduledInterval {
            id: o.occurrence_key.to_string(),
            location: "Activity Room".to_string(),
            start_at: o.start_at + Duration::minutes(30),
            end_at: o.end_at + Duration::minutes(30),
        })
        .collect();

    c.bench_function("find_conflicts_one_year", |b| {
        b.iter(|| find_conflicts(black_box(&generated), black_box(&bookings)))
    });
}

criterion_group!(benches, bench_expand);
criterion_main!(benches);
