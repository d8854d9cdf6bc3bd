// MechInsight Trainer - Predictive-maintenance models
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # MechInsight Trainer
//!
//! Fits four models on a MechInsight telemetry table:
//!
//! - **Anomaly detector**: isolation forest on standardized features
//! - **Anomaly-type classifier**: random forest on anomalous rows
//! - **Maintenance regressor**: windowed ridge vs. row forest, best R² wins
//! - **Health regressor**: random forest on raw features
//!
//! Models, scalers and a training report are saved as JSON. Test-split
//! predictions are written back to the rows they were made for.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mechinsight::Dataset;
//! use mechinsight_trainer::{Trainer, TrainerConfig};
//!
//! let dataset = Dataset::from_csv("cnc_machine_data_improved.csv").unwrap();
//! let trainer = Trainer::new(TrainerConfig::default()).unwrap();
//! let outcome = trainer.train(&dataset).unwrap();
//!
//! outcome.save("models").unwrap();
//! outcome
//!     .write_predictions(&dataset, "cnc_machine_predictions.csv")
//!     .unwrap();
//! ```

pub mod artifacts;
pub mod config;
pub mod error;
pub mod isolation;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod scaler;
pub mod split;
pub mod table;

pub use artifacts::ModelArtifacts;
pub use config::{
    ClassifierConfig, DetectorConfig, ForestParams, HealthModelConfig, MaintenanceConfig,
    TrainerConfig, DEFAULT_SEED,
};
pub use error::{Result, TrainerError};
pub use isolation::{IsolationForest, IsolationForestConfig};
pub use models::{AnomalyDetector, MaintenanceModel, TypeClassifier};
pub use pipeline::{RowPrediction, Trainer, TrainingOutcome, TrainingReport, PREDICTION_COLUMNS};
pub use scaler::{MinMaxScaler, StandardScaler};
pub use table::{feature_matrix, FEATURE_COLUMNS, NUM_FEATURES};
