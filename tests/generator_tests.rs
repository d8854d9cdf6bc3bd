// MechInsight - Generator integration tests
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

use approx::assert_relative_eq;
use mechinsight::anomalies::{
    AnomalyInjector, AnomalyType, TOOL_BREAK_COLLAPSE_SEVERITY, TOOL_BREAK_FORCE_COLLAPSE,
};
use mechinsight::features::apply_derived_features;
use mechinsight::health::{apply_health_overlay, schedule_maintenance, walk_health};
use mechinsight::signals::generate_base_signals;
use mechinsight::{generate_dataset, Dataset, GeneratorConfig, Sample};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

fn assert_bounds(samples: &[Sample], pass: &str) {
    for (i, s) in samples.iter().enumerate() {
        assert!(
            (0.0..=100.0).contains(&s.machine_health_score),
            "{}: health {} out of range at {}",
            pass,
            s.machine_health_score,
            i
        );
        assert!(
            (0.0..=30.0).contains(&s.days_to_maintenance),
            "{}: days {} out of range at {}",
            pass,
            s.days_to_maintenance,
            i
        );
    }
}

fn csv_bytes(dataset: &Dataset) -> Vec<u8> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    dataset.write_csv(&mut writer).unwrap();
    writer.into_inner().unwrap()
}

#[test]
fn test_bounds_after_every_pass() {
    let config = GeneratorConfig::default();
    let mut rng = StdRng::seed_from_u64(42);

    let mut samples = generate_base_signals(
        config.start_time,
        config.num_samples(),
        &config.signals,
        &mut rng,
    )
    .unwrap();

    apply_health_overlay(&mut samples, &config.health, &mut rng).unwrap();
    assert_bounds(&samples, "health");

    AnomalyInjector::new(&config.anomalies)
        .unwrap()
        .inject(&mut samples, &mut rng)
        .unwrap();
    assert_bounds(&samples, "anomalies");

    apply_derived_features(&mut samples, &config.features);
    assert_bounds(&samples, "features");
}

#[test]
fn test_cumulative_hours_non_decreasing() {
    let generated = generate_dataset(&GeneratorConfig::default()).unwrap();
    let samples = generated.dataset.samples();
    assert!(samples
        .windows(2)
        .all(|w| w[1].total_machine_hours >= w[0].total_machine_hours));
}

#[test]
fn test_padded_footprints_disjoint() {
    let config = GeneratorConfig::default();
    let generated = generate_dataset(&config).unwrap();
    let n = generated.dataset.len();
    let margin = config.anomalies.margin;

    let mut spans: Vec<(usize, usize)> = generated
        .episodes
        .iter()
        .map(|e| (e.start_sample, e.end_sample()))
        .collect();
    spans.sort();

    assert!(spans.first().unwrap().0 >= margin);
    assert!(spans.last().unwrap().1 + margin <= n);
    for w in spans.windows(2) {
        assert!(w[1].0 >= w[0].1 + margin, "episodes {:?} too close", w);
    }
}

#[test]
fn test_episode_lengths_sum_to_budget() {
    let generated = generate_dataset(&GeneratorConfig::default()).unwrap();
    let total: usize = generated.episodes.iter().map(|e| e.length).sum();
    assert_eq!(total, 324);
    assert_eq!(generated.dataset.anomaly_count(), 324);
}

#[test]
fn test_episodes_match_labels() {
    let generated = generate_dataset(&GeneratorConfig::default()).unwrap();
    let samples = generated.dataset.samples();
    for (i, s) in samples.iter().enumerate() {
        let episode = generated.episodes.iter().find(|e| e.contains(i));
        match episode {
            Some(e) => {
                assert!(s.is_anomaly);
                assert_eq!(s.anomaly_type, e.anomaly_type);
                assert!(s.anomaly_severity <= e.peak_severity);
            }
            None => {
                assert!(!s.is_anomaly);
                assert_eq!(s.anomaly_type, AnomalyType::Normal);
            }
        }
    }
}

#[test]
fn test_tool_break_force_collapse() {
    let config = GeneratorConfig::default();
    let mut checked = 0;

    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut samples = generate_base_signals(
            config.start_time,
            config.num_samples(),
            &config.signals,
            &mut rng,
        )
        .unwrap();
        apply_health_overlay(&mut samples, &config.health, &mut rng).unwrap();
        let before = samples.clone();

        AnomalyInjector::new(&config.anomalies)
            .unwrap()
            .inject(&mut samples, &mut rng)
            .unwrap();

        for (after, orig) in samples.iter().zip(&before) {
            if after.anomaly_type == AnomalyType::ToolBreak
                && after.anomaly_severity > TOOL_BREAK_COLLAPSE_SEVERITY
            {
                assert_relative_eq!(
                    after.cutting_force_n,
                    orig.cutting_force_n * TOOL_BREAK_FORCE_COLLAPSE,
                    max_relative = 1e-12
                );
                checked += 1;
            }
        }
    }

    assert!(checked > 0, "no high-severity tool breaks in 20 runs");
}

#[test]
fn test_same_seed_byte_identical_csv() {
    let config = GeneratorConfig::default().with_seed(42);
    let a = generate_dataset(&config).unwrap();
    let b = generate_dataset(&config).unwrap();
    assert_eq!(csv_bytes(&a.dataset), csv_bytes(&b.dataset));
}

#[test]
fn test_checkpoint_pre_noise_values() {
    let config = GeneratorConfig::default();
    let mut rng = StdRng::seed_from_u64(42);
    let mut samples = generate_base_signals(
        config.start_time,
        config.num_samples(),
        &config.signals,
        &mut rng,
    )
    .unwrap();

    let checkpoints = schedule_maintenance(&config.health, &mut rng);
    walk_health(&mut samples, &checkpoints, &config.health);

    let inside: Vec<usize> = checkpoints
        .iter()
        .copied()
        .filter(|&c| c < samples.len())
        .collect();
    assert!(!inside.is_empty());
    for c in inside {
        assert_eq!(samples[c].machine_health_score, 100.0);
        assert_eq!(samples[c].days_to_maintenance, 30.0);
        if c > 0 {
            assert!(samples[c - 1].machine_health_score < 100.0);
        }
    }
}

#[test]
fn test_first_vibration_trend_equals_reading() {
    let generated = generate_dataset(&GeneratorConfig::default()).unwrap();
    let first = &generated.dataset.samples()[0];
    assert_eq!(first.vibration_trend, first.vibration_rms);
    assert_eq!(first.vibration_std_24h, 0.0);
}

#[test]
fn test_csv_file_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cnc_machine_data_improved.csv");
    let config = GeneratorConfig::new().with_num_days(30).with_seed(5);
    let generated = generate_dataset(&config).unwrap();

    generated.dataset.to_csv(&path).unwrap();
    let loaded = Dataset::from_csv(&path).unwrap();

    assert_eq!(loaded.len(), generated.dataset.len());
    assert_eq!(loaded.anomaly_count(), generated.dataset.anomaly_count());
    for (a, b) in loaded.samples().iter().zip(generated.dataset.samples()) {
        assert_eq!(a.timestamp, b.timestamp);
        assert_eq!(a.anomaly_type, b.anomaly_type);
        assert_eq!(a.machine_health_score, b.machine_health_score);
    }
}

#[test]
fn test_health_tracks_maintenance() {
    let generated = generate_dataset(&GeneratorConfig::default()).unwrap();
    let corr = generated
        .dataset
        .correlation(|s| s.machine_health_score, |s| s.days_to_maintenance)
        .unwrap();
    assert!(corr > 0.5, "correlation {}", corr);
}
