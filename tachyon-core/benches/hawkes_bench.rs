//! Hawkes Intensity Benchmarks
//!
//! Per-event update cost, which sits on every tick of the hot path, and
//! publication through the shared seqlock cell.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tachyon::config::IntensityConfig;
use tachyon::core::{MarketEvent, Side};
use tachyon::hawkes::{IntensityEngine, SharedIntensity};

fn update_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("hawkes/update");
    group.significance_level(0.01).sample_size(1000);

    let mut engine = IntensityEngine::new(IntensityConfig::default()).unwrap();
    let mut seq = 0u64;

    group.bench_function("alternating_sides", |b| {
        b.iter(|| {
            seq += 1;
            let side = if seq % 3 == 0 { Side::Sell } else { Side::Buy };
            let event = MarketEvent::trade(seq, seq * 2_000, side, 100.0, 5);
            black_box(engine.update(black_box(&event), event.timestamp_ns))
        });
    });

    group.bench_function("predict", |b| {
        b.iter(|| black_box(engine.predict(black_box(1_000_000))));
    });

    group.finish();
}

fn shared_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("hawkes/shared");

    let shared = SharedIntensity::new();
    let mut engine = IntensityEngine::new(IntensityConfig::default()).unwrap();
    let state = engine.update(&MarketEvent::trade(1, 1_000, Side::Buy, 100.0, 1), 1_000);

    group.bench_function("store", |b| {
        b.iter(|| shared.store(black_box(&state)));
    });

    group.bench_function("load", |b| {
        b.iter(|| black_box(shared.load()));
    });

    group.finish();
}

criterion_group!(benches, update_bench, shared_bench);
criterion_main!(benches);
