//! Risk Gate Benchmarks
//!
//! Accept/reject cost of the CAS gate, uncontended and with several gates
//! sharing one `RiskState`.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use std::thread;
use tachyon::config::{RegimeTable, RiskGateConfig};
use tachyon::core::{Decision, Side};
use tachyon::risk::{RiskGate, RiskState};

fn decision(side: Side, size: u64) -> Decision {
    Decision {
        timestamp_ns: 0,
        side,
        price: 100.0,
        size,
        signal_strength: 0.5,
    }
}

fn uncontended_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("risk_gate/uncontended");
    group.significance_level(0.01).sample_size(1000);

    let state = Arc::new(RiskState::new(1_000, RegimeTable::default()));
    let mut gate = RiskGate::new(Arc::clone(&state), RiskGateConfig::default());
    let mut seq = 0u64;

    group.bench_function("accept_round_trip", |b| {
        b.iter(|| {
            seq += 1;
            let side = if seq % 2 == 0 { Side::Sell } else { Side::Buy };
            black_box(gate.check_and_apply(black_box(&decision(side, 10)), seq))
        });
    });

    state.reset_position(1_000);
    group.bench_function("breach_reject", |b| {
        b.iter(|| {
            seq += 1;
            black_box(gate.check_and_apply(black_box(&decision(Side::Buy, 10)), seq))
        });
    });

    group.bench_function("hold", |b| {
        b.iter(|| black_box(gate.check_and_apply(black_box(&Decision::hold(0, 0.0)), 0)));
    });

    group.finish();
}

fn contended_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("risk_gate/contended");

    for threads in [2usize, 4].iter() {
        group.bench_with_input(BenchmarkId::new("threads", threads), threads, |b, &threads| {
            b.iter(|| {
                let state = Arc::new(RiskState::new(1_000, RegimeTable::default()));
                let handles: Vec<_> = (0..threads)
                    .map(|t| {
                        let mut gate = RiskGate::new(Arc::clone(&state), RiskGateConfig::default());
                        thread::spawn(move || {
                            let side = if t % 2 == 0 { Side::Buy } else { Side::Sell };
                            for seq in 0..10_000u64 {
                                black_box(gate.check_and_apply(&decision(side, 1), seq));
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
                black_box(state.position())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, uncontended_bench, contended_bench);
criterion_main!(benches);
