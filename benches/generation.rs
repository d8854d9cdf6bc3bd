//! Benchmarks for MechInsight dataset generation

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use mechinsight::features::apply_derived_features;
use mechinsight::signals::generate_base_signals;
use mechinsight::{generate_dataset, FeatureConfig, GeneratorConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_full_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");

    let config = GeneratorConfig::default();
    group.throughput(Throughput::Elements(config.num_samples() as u64));

    group.bench_function("generate_90_days", |b| {
        b.iter(|| {
            let generated = generate_dataset(black_box(&config)).unwrap();
            black_box(generated);
        })
    });

    group.finish();
}

fn bench_passes(c: &mut Criterion) {
    let mut group = c.benchmark_group("passes");

    let config = GeneratorConfig::default();
    let n = config.num_samples();
    group.throughput(Throughput::Elements(n as u64));

    group.bench_function("base_signals", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(42);
            let samples =
                generate_base_signals(config.start_time, n, &config.signals, &mut rng).unwrap();
            black_box(samples);
        })
    });

    // Setup - features run over pre-generated signals
    let mut rng = StdRng::seed_from_u64(42);
    let base = generate_base_signals(config.start_time, n, &config.signals, &mut rng).unwrap();
    let features = FeatureConfig::default();

    group.bench_function("derived_features", |b| {
        b.iter(|| {
            let mut samples = base.clone();
            apply_derived_features(&mut samples, &features);
            black_box(samples);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_full_generation, bench_passes);
criterion_main!(benches);
