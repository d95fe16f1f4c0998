//! Event Scheduler Benchmarks
//!
//! Schedule/advance cost with deadlines inside the wheel horizon, beyond it
//! (overflow heap), and cancellation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tachyon::config::SchedulerConfig;
use tachyon::scheduler::EventScheduler;

fn schedule_advance_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler/schedule_advance");
    let config = SchedulerConfig::default();
    let horizon = config.wheel_slots as u64 * config.slot_width_ns;

    for (name, spread) in [("wheel", horizon / 2), ("overflow", horizon * 8)] {
        group.throughput(Throughput::Elements(1_000));
        group.bench_with_input(BenchmarkId::new(name, 1_000), &spread, |b, &spread| {
            let mut scheduler = EventScheduler::<u64>::new(config).unwrap();
            b.iter(|| {
                let base = scheduler.now_ns();
                for i in 0..1_000u64 {
                    // scattered deadlines, not monotone
                    let offset = (i.wrapping_mul(7_919) % 1_000) * (spread / 1_000).max(1);
                    scheduler.schedule(i, base + offset + 1).unwrap();
                }
                let mut fired = 0u64;
                scheduler.advance(base + spread + 1, &mut |ev| fired += ev.payload);
                black_box(fired)
            });
        });
    }

    group.finish();
}

fn cancel_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler/cancel");
    let config = SchedulerConfig::default();

    group.bench_function("schedule_then_cancel", |b| {
        let mut scheduler = EventScheduler::<u64>::new(config).unwrap();
        b.iter(|| {
            let handle = scheduler.schedule(1, scheduler.now_ns() + 10_000).unwrap();
            black_box(scheduler.cancel(handle))
        });
    });

    group.finish();
}

criterion_group!(benches, schedule_advance_bench, cancel_bench);
criterion_main!(benches);
