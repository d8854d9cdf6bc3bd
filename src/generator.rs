// MechInsight - Core generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Core dataset generation logic.
//!
//! Generation runs four passes over one sample sequence, all driven by a
//! single seeded random stream:
//!
//! 1. base signals and usage counters
//! 2. health degradation and maintenance resets
//! 3. anomaly episodes
//! 4. derived features
//!
//! The pass order is fixed; derived features always see the anomalous values.

use crate::anomalies::{AnomalyEpisode, AnomalyInjector};
use crate::config::GeneratorConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::features::apply_derived_features;
use crate::health::apply_health_overlay;
use crate::signals::generate_base_signals;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

/// Hourly sampling interval in milliseconds.
pub const SAMPLE_INTERVAL_MS: u64 = 3_600_000;

/// A generated dataset plus the ground truth used to build it.
#[derive(Debug, Clone)]
pub struct GeneratedDataset {
    /// The telemetry table.
    pub dataset: Dataset,
    /// Injected episodes in placement order.
    pub episodes: Vec<AnomalyEpisode>,
    /// Sample indices of maintenance events (may exceed the horizon).
    pub maintenance_checkpoints: Vec<usize>,
}

/// Generate a dataset from configuration.
pub fn generate_dataset(config: &GeneratorConfig) -> Result<GeneratedDataset> {
    config.validate()?;

    let mut rng = match config.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let num_samples = config.num_samples();
    info!(
        days = config.num_days,
        seed = ?config.seed,
        "Generating {} samples",
        num_samples
    );

    let mut samples =
        generate_base_signals(config.start_time, num_samples, &config.signals, &mut rng)?;
    let maintenance_checkpoints = apply_health_overlay(&mut samples, &config.health, &mut rng)?;
    let episodes = AnomalyInjector::new(&config.anomalies)?.inject(&mut samples, &mut rng)?;
    apply_derived_features(&mut samples, &config.features);

    let mut dataset = Dataset::new(samples)
        .with_name("cnc_machine_data")
        .with_description("Synthetic CNC machine telemetry");
    dataset.metadata.seed = config.seed;
    dataset.metadata.sample_interval_ms = Some(SAMPLE_INTERVAL_MS);

    info!(
        anomalies = dataset.anomaly_count(),
        episodes = episodes.len(),
        "Generation complete"
    );

    Ok(GeneratedDataset {
        dataset,
        episodes,
        maintenance_checkpoints,
    })
}
