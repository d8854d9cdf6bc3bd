// MechInsight Trainer - Predictive-maintenance models
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Configuration types for MechInsight Trainer

use crate::error::{Result, TrainerError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Default random seed for splits and forests.
pub const DEFAULT_SEED: u64 = 42;

/// Training pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Seed for every split and model.
    pub seed: u64,
    /// Isolation forest anomaly detector.
    pub detector: DetectorConfig,
    /// Anomaly-type classifier.
    pub classifier: ClassifierConfig,
    /// Days-to-maintenance regressor.
    pub maintenance: MaintenanceConfig,
    /// Health-score regressor.
    pub health: HealthModelConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            detector: DetectorConfig::default(),
            classifier: ClassifierConfig::default(),
            maintenance: MaintenanceConfig::default(),
            health: HealthModelConfig::default(),
        }
    }
}

impl TrainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the maintenance sequence window.
    pub fn with_window(mut self, window: usize) -> Self {
        self.maintenance.window = window;
        self
    }

    /// Lightweight settings for quick runs: fewer, shallower trees.
    pub fn fast() -> Self {
        Self::default().with_fast_forests()
    }

    /// Cut every forest down to quick-run size, keeping other settings.
    pub fn with_fast_forests(mut self) -> Self {
        self.detector.n_trees = 25;
        self.classifier.forest.n_trees = 10;
        self.maintenance.forest.n_trees = 10;
        self.maintenance.forest.max_depth = Some(8);
        self.health.forest.n_trees = 10;
        self
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        let fractions = [
            ("detector", self.detector.test_fraction),
            ("classifier", self.classifier.test_fraction),
            ("maintenance", self.maintenance.test_fraction),
            ("health", self.health.test_fraction),
        ];
        for (name, fraction) in fractions {
            if !(fraction > 0.0 && fraction < 1.0) {
                return Err(TrainerError::InvalidConfig(format!(
                    "{} test fraction {} outside (0, 1)",
                    name, fraction
                )));
            }
        }
        if self.detector.n_trees == 0
            || self.classifier.forest.n_trees == 0
            || self.maintenance.forest.n_trees == 0
            || self.health.forest.n_trees == 0
        {
            return Err(TrainerError::InvalidConfig(
                "every forest needs at least one tree".to_string(),
            ));
        }
        if self.maintenance.window == 0 || self.maintenance.n_bins == 0 {
            return Err(TrainerError::InvalidConfig(
                "maintenance window and bin count must be positive".to_string(),
            ));
        }
        if self.maintenance.ridge_alpha <= 0.0 {
            return Err(TrainerError::InvalidConfig(
                "ridge alpha must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Random forest hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_trees: u16,
    pub max_depth: Option<u16>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Isolation forest detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub n_trees: usize,
    pub max_samples: usize,
    pub test_fraction: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_samples: 256,
            test_fraction: 0.2,
        }
    }
}

/// Anomaly-type classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub forest: ForestParams,
    pub test_fraction: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            forest: ForestParams::default(),
            test_fraction: 0.3,
        }
    }
}

/// Days-to-maintenance regressor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Samples per input window of the sequence model.
    pub window: usize,
    /// L2 penalty of the sequence model.
    pub ridge_alpha: f64,
    /// Quantile bins used to stratify the sequence split.
    pub n_bins: usize,
    pub test_fraction: f64,
    /// Single-row comparison forest.
    pub forest: ForestParams,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            window: 48,
            ridge_alpha: 1.0,
            n_bins: 5,
            test_fraction: 0.2,
            forest: ForestParams {
                n_trees: 200,
                max_depth: Some(20),
                min_samples_split: 5,
                min_samples_leaf: 2,
            },
        }
    }
}

/// Health-score regressor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthModelConfig {
    pub forest: ForestParams,
    pub test_fraction: f64,
}

impl Default for HealthModelConfig {
    fn default() -> Self {
        Self {
            forest: ForestParams::default(),
            test_fraction: 0.2,
        }
    }
}
