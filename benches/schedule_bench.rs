use std::hint::black_box;

use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use cronplan::parser::ScheduleParser;

fn parse_take_100(pattern: &str) {
    let schedule = ScheduleParser::new()
        .parse(pattern)
        .expect("Couldn't parse schedule");
    let time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    for _time in schedule.iter_after(time).take(100) {}
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("parse_take_100", |b| {
        b.iter(|| parse_take_100(black_box("15 15 15 29 2 *")))
    });
    c.bench_function("parse_take_100_weekdays", |b| {
        b.iter(|| parse_take_100(black_box("0 0,30 9-17 13 * 1-5")))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
