// MechInsight - Dataset manifest
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Dataset manifest describing a generated run.
//!
//! The manifest lists the injected episodes and maintenance checkpoints plus
//! summary statistics, so a CSV can be checked without regenerating it.

use crate::anomalies::{AnomalyEpisode, AnomalyType};
use crate::dataset::{ColumnStats, Dataset};
use crate::generator::GeneratedDataset;
use crate::sample::{Channel, Sample};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dataset manifest describing a generated dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetManifest {
    /// Dataset name (matches filename without extension).
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Number of samples.
    pub sample_count: usize,
    /// Sample interval in milliseconds.
    pub sample_interval_ms: u64,
    /// First sample timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveDateTime>,
    /// Last sample timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveDateTime>,
    /// Sensor channel ranges.
    #[serde(default)]
    pub sensors: Vec<SensorManifest>,
    /// Sample indices where maintenance resets health.
    #[serde(default)]
    pub maintenance_checkpoints: Vec<usize>,
    /// Injected anomaly episodes in placement order.
    #[serde(default)]
    pub episodes: Vec<AnomalyEpisode>,
    /// Summary statistics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<DatasetSummary>,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
    /// Random seed used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Sensor information in manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorManifest {
    /// Column name.
    pub id: String,
    /// Unit of measurement.
    pub unit: String,
    /// Minimum value in dataset.
    pub min: f64,
    /// Maximum value in dataset.
    pub max: f64,
}

/// Summary statistics of a generated dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Number of anomalous samples.
    pub anomaly_samples: usize,
    /// Anomalous share of the dataset in percent.
    pub anomaly_percentage: f64,
    /// Anomalous samples per fault type label.
    pub anomaly_counts: BTreeMap<String, usize>,
    /// Health score statistics.
    pub health: ColumnStats,
    /// Days-to-maintenance statistics.
    pub days_to_maintenance: ColumnStats,
    /// Pearson correlation of health and days-to-maintenance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_maintenance_correlation: Option<f64>,
}

impl DatasetSummary {
    /// Summarize a dataset (None if empty).
    pub fn from_dataset(dataset: &Dataset) -> Option<Self> {
        let health = dataset.stats(|s| s.machine_health_score)?;
        let days_to_maintenance = dataset.stats(|s| s.days_to_maintenance)?;

        let mut anomaly_counts: BTreeMap<AnomalyType, usize> = BTreeMap::new();
        for sample in dataset.samples().iter().filter(|s| s.is_anomaly) {
            *anomaly_counts.entry(sample.anomaly_type).or_default() += 1;
        }
        let anomaly_samples = anomaly_counts.values().sum();

        Some(Self {
            anomaly_samples,
            anomaly_percentage: anomaly_samples as f64 / dataset.len() as f64 * 100.0,
            anomaly_counts: anomaly_counts
                .into_iter()
                .map(|(t, c)| (t.label().to_string(), c))
                .collect(),
            health,
            days_to_maintenance,
            health_maintenance_correlation: dataset
                .correlation(|s| s.machine_health_score, |s| s.days_to_maintenance),
        })
    }
}

impl DatasetManifest {
    /// Create a new manifest.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            sample_count: 0,
            sample_interval_ms: 3_600_000,
            start_time: None,
            end_time: None,
            sensors: Vec::new(),
            maintenance_checkpoints: Vec::new(),
            episodes: Vec::new(),
            summary: None,
            generated_at: Utc::now(),
            seed: None,
        }
    }

    /// Build a complete manifest for a generated dataset.
    pub fn from_generated(name: &str, generated: &GeneratedDataset) -> Self {
        let dataset = &generated.dataset;
        let samples = dataset.samples();

        let mut manifest = Self::new(name)
            .with_description(
                dataset
                    .metadata
                    .description
                    .as_deref()
                    .unwrap_or("Synthetic CNC machine telemetry"),
            )
            .with_checkpoints(generated.maintenance_checkpoints.clone())
            .with_episodes(generated.episodes.clone());

        manifest.sample_count = dataset.len();
        if let Some(interval) = dataset.metadata.sample_interval_ms {
            manifest.sample_interval_ms = interval;
        }
        manifest.start_time = samples.first().map(|s| s.timestamp);
        manifest.end_time = samples.last().map(|s| s.timestamp);
        manifest.sensors = Channel::ALL
            .iter()
            .filter_map(|c| SensorManifest::from_samples(*c, samples))
            .collect();
        manifest.summary = DatasetSummary::from_dataset(dataset);
        manifest.seed = dataset.metadata.seed;
        manifest
    }

    /// Set description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    /// Set maintenance checkpoints.
    pub fn with_checkpoints(mut self, checkpoints: Vec<usize>) -> Self {
        self.maintenance_checkpoints = checkpoints;
        self
    }

    /// Set anomaly episodes.
    pub fn with_episodes(mut self, episodes: Vec<AnomalyEpisode>) -> Self {
        self.episodes = episodes;
        self
    }

    /// Set seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to JSON file.
    pub fn to_json_file(&self, path: impl AsRef<std::path::Path>) -> crate::Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load from JSON file.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl SensorManifest {
    /// Observed range of one channel (None if there are no samples).
    pub fn from_samples(channel: Channel, samples: &[Sample]) -> Option<Self> {
        let values: Vec<f64> = samples.iter().map(|s| s.channel(channel)).collect();
        let stats = ColumnStats::from_values(&values)?;
        Some(Self {
            id: channel.column().to_string(),
            unit: channel.unit().to_string(),
            min: stats.min,
            max: stats.max,
        })
    }
}
