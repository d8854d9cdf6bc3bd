// MechInsight - Synthetic CNC telemetry
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # MechInsight
//!
//! Synthetic telemetry generator for a CNC machining center.
//!
//! The generator produces an hourly table of sensor readings, usage counters,
//! a machine health score, days to the next maintenance, and labeled anomaly
//! episodes. Runs are fully reproducible from a seed.
//!
//! - **Base signals**: independent normal draws per sensor plus usage counters
//! - **Health overlay**: hour-driven decay with maintenance resets
//! - **Anomaly injection**: non-overlapping episodes with ramped severity
//! - **Derived features**: trailing-window trends and stability measures
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mechinsight::{generate_dataset, DatasetManifest, GeneratorConfig};
//!
//! let config = GeneratorConfig::new().with_num_days(90).with_seed(42);
//! let generated = generate_dataset(&config).unwrap();
//!
//! generated.dataset.to_csv("cnc_machine_data_improved.csv").unwrap();
//! DatasetManifest::from_generated("cnc_machine_data_improved", &generated)
//!     .to_json_file("cnc_machine_data_improved.manifest.json")
//!     .unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Generator configuration and validation
//! - [`signals`]: Base sensor signals and usage counters
//! - [`health`]: Health decay and maintenance schedule
//! - [`anomalies`]: Fault catalog and episode injection
//! - [`features`]: Rolling-window derived features
//! - [`dataset`]: Telemetry table and CSV I/O
//! - [`manifest`]: JSON description of a generated run

pub mod anomalies;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod generator;
pub mod health;
pub mod manifest;
pub mod sample;
pub mod signals;

// Re-exports for convenient access
pub use anomalies::{AnomalyEpisode, AnomalyInjector, AnomalyProfile, AnomalyType};
pub use config::{
    AnomalyConfig, FeatureConfig, Gaussian, GeneratorConfig, HealthConfig, SignalConfig,
    DEFAULT_SEED, SAMPLES_PER_DAY,
};
pub use dataset::{ColumnStats, Dataset, DatasetMetadata};
pub use error::{GeneratorError, Result};
pub use generator::{generate_dataset, GeneratedDataset, SAMPLE_INTERVAL_MS};
pub use manifest::{DatasetManifest, DatasetSummary, SensorManifest};
pub use sample::{Channel, Sample, TIMESTAMP_FORMAT};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
