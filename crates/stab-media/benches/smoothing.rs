//! Trajectory Smoothing Benchmarks
//!
//! Compares the per-window, running-sum and rayon smoothers.
//!
//! # Running Benchmarks
//! ```bash
//! cargo bench --package stab-media --bench smoothing
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stab_media::trajectory::{accumulate, SmoothingMethod};
use stab_media::{stabilize, Motion};
use std::time::Duration;

/// Deterministic shaky camera motion.
fn shaky_motions(n: usize) -> Vec<Motion> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            Motion::new((t * 0.7).sin() * 4.0, (t * 1.3).cos() * 3.0, (t * 0.9).sin() * 0.02)
        })
        .collect()
}

fn bench_smoothers(c: &mut Criterion) {
    let mut group = c.benchmark_group("smooth");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    let trajectory = accumulate(&shaky_motions(10_000));
    let methods = [
        ("window", SmoothingMethod::Window),
        ("running", SmoothingMethod::Running),
        ("parallel", SmoothingMethod::Parallel),
    ];

    for radius in [5usize, 30, 120] {
        group.throughput(Throughput::Elements(trajectory.len() as u64));
        for (name, method) in methods {
            group.bench_with_input(BenchmarkId::new(name, radius), &radius, |b, &radius| {
                b.iter(|| black_box(method.apply(black_box(&trajectory), radius)))
            });
        }
    }

    group.finish();
}

fn bench_full_stabilize(c: &mut Criterion) {
    let mut group = c.benchmark_group("stabilize");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    for frames in [300usize, 3_000, 30_000] {
        let motions = shaky_motions(frames);
        group.throughput(Throughput::Elements(frames as u64));
        group.bench_with_input(BenchmarkId::new("radius_30", frames), &motions, |b, motions| {
            b.iter(|| black_box(stabilize(black_box(motions), 30)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_smoothers, bench_full_stabilize);
criterion_main!(benches);
