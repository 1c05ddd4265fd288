use chrono::{Duration, NaiveDate};
use criterion::{Criterion, criterion_group, criterion_main};
use padpals_client::calendar::project_month;
use padpals_client::{CycleEntry, CycleStatistics, Flow};
use std::hint::black_box;

fn history(cycles: i64) -> Vec<CycleEntry> {
    let first = NaiveDate::from_ymd_opt(2015, 1, 3).expect("date");
    (0..cycles)
        .rev()
        .map(|i| {
            let start = first + Duration::days(i * 28 + i % 3);
            CycleEntry::new(start, Some(start + Duration::days(4 + i % 2)), Flow::Medium)
        })
        .collect()
}

fn bench_statistics(c: &mut Criterion) {
    let entries = history(120);
    c.bench_function("cycle_statistics_120_entries", |b| {
        b.iter(|| CycleStatistics::compute(black_box(&entries)))
    });

    let stats = CycleStatistics::compute(&entries);
    c.bench_function("project_month_120_entries", |b| {
        b.iter(|| project_month(2024, 6, black_box(&entries), &stats).expect("calendar"))
    });
}

criterion_group!(benches, bench_statistics);
criterion_main!(benches);
