//! Counting engine micro-benchmark.
//!
//! Measures throughput of the streaming path:
//! - peak–valley filtering alone (counting method `None`)
//! - full four-point counting with all accumulators
//! - HCM counting
//! - counting with damage spreading over turning points

use criterion::{Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fatigue::flags::CountFlags;
use fatigue::methods::{CountingMethod, ResidualMethod, SpreadMethod};
use fatigue_rainflow::RainflowEngine;

const CLASSES: u16 = 64;
const SAMPLES: usize = 100_000;

/// Reproducible random-walk load history inside the class range.
fn load_history() -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut v = 32.0;
    (0..SAMPLES)
        .map(|_| {
            v += rng.gen_range(-4.0..4.0);
            v = v.clamp(0.0, 63.999);
            v
        })
        .collect()
}

fn engine(method: CountingMethod) -> RainflowEngine {
    let mut e = RainflowEngine::new(CLASSES, 1.0, 0.0, 1.0, CountFlags::STANDARD).unwrap();
    e.wl_init_elementary(10.0, 1e6, -5.0).unwrap();
    e.set_counting_method(method).unwrap();
    e
}

fn bench_filter_only(c: &mut Criterion) {
    let history = load_history();
    c.bench_function("filter_only_100k", |b| {
        b.iter(|| {
            let mut e = engine(CountingMethod::None);
            e.feed(&history).unwrap();
            e.finalize(ResidualMethod::None).unwrap();
            e.residue().len()
        })
    });
}

fn bench_four_point(c: &mut Criterion) {
    let history = load_history();
    c.bench_function("four_point_100k", |b| {
        b.iter(|| {
            let mut e = engine(CountingMethod::FourPoint);
            e.feed(&history).unwrap();
            e.finalize(ResidualMethod::None).unwrap();
            e.damage()
        })
    });
}

fn bench_hcm(c: &mut Criterion) {
    let history = load_history();
    c.bench_function("hcm_100k", |b| {
        b.iter(|| {
            let mut e = engine(CountingMethod::Hcm);
            e.feed(&history).unwrap();
            e.finalize(ResidualMethod::None).unwrap();
            e.damage()
        })
    });
}

fn bench_with_spread(c: &mut Criterion) {
    let history = load_history();
    c.bench_function("four_point_spread_100k", |b| {
        b.iter(|| {
            let mut e = engine(CountingMethod::FourPoint);
            e.tp_init(SAMPLES, false).unwrap();
            e.dh_init(SpreadMethod::RampDamage23, SAMPLES, false).unwrap();
            e.feed(&history).unwrap();
            e.finalize(ResidualMethod::None).unwrap();
            e.damage()
        })
    });
}

criterion_group!(
    benches,
    bench_filter_only,
    bench_four_point,
    bench_hcm,
    bench_with_spread
);
criterion_main!(benches);
