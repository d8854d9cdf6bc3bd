// MechInsight Trainer - Predictive-maintenance models
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! End-to-end training run.
//!
//! One seeded RNG drives every split and forest in a fixed order (detector,
//! classifier, maintenance, health), so a seed fully determines the run.

use crate::artifacts::{save_json, ModelArtifacts, REPORT_FILE};
use crate::config::TrainerConfig;
use crate::error::{Result, TrainerError};
use crate::models::{
    train_anomaly_detector, train_health_regressor, train_maintenance_regressor,
    train_type_classifier, ClassifierReport, DetectorReport, HealthReport, MaintenanceReport,
};
use crate::table::{feature_matrix, take_rows, FEATURE_COLUMNS};
use chrono::{DateTime, Utc};
use mechinsight::{AnomalyType, Dataset, Sample};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Anomalous rows needed before the type classifier is trained.
pub const MIN_CLASSIFIER_ROWS: usize = 4;

/// Extra prediction columns appended to the dataset columns.
pub const PREDICTION_COLUMNS: [&str; 4] = [
    "anomaly_score",
    "predicted_anomaly",
    "predicted_days_to_maintenance",
    "predicted_health_score",
];

/// Summary of a training run, saved as `training_report.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub trained_at: DateTime<Utc>,
    pub seed: u64,
    pub rows: usize,
    pub anomaly_rows: usize,
    pub feature_columns: Vec<String>,
    pub detector: DetectorReport,
    /// Absent when there were too few anomalous rows or fault types.
    pub classifier: Option<ClassifierReport>,
    pub maintenance: MaintenanceReport,
    pub health: HealthReport,
}

/// Model outputs for one dataset row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowPrediction {
    pub anomaly_score: f64,
    pub predicted_anomaly: bool,
    /// Set only on maintenance test rows.
    pub days_to_maintenance: Option<f64>,
    /// Set only on health test rows.
    pub health_score: Option<f64>,
}

impl RowPrediction {
    fn csv_cells(&self) -> [String; 4] {
        let optional = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        [
            self.anomaly_score.to_string(),
            u8::from(self.predicted_anomaly).to_string(),
            optional(self.days_to_maintenance),
            optional(self.health_score),
        ]
    }
}

/// Fitted models, report and per-row predictions.
#[derive(Debug)]
pub struct TrainingOutcome {
    pub artifacts: ModelArtifacts,
    pub report: TrainingReport,
    pub predictions: Vec<RowPrediction>,
}

impl TrainingOutcome {
    /// Save every artifact plus the report into `dir`.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        self.artifacts.save(dir)?;
        save_json(dir, REPORT_FILE, &self.report)?;
        Ok(())
    }

    /// Write the dataset with prediction columns appended.
    pub fn write_predictions(&self, dataset: &Dataset, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path)?;
        self.write_predictions_to(dataset, &mut writer)?;
        info!("Wrote predictions for {} rows to {}", dataset.len(), path.display());
        Ok(())
    }

    /// Write the prediction table to any writer.
    pub fn write_predictions_to<W: Write>(
        &self,
        dataset: &Dataset,
        writer: &mut csv::Writer<W>,
    ) -> Result<()> {
        if dataset.len() != self.predictions.len() {
            return Err(TrainerError::DimensionMismatch {
                expected: self.predictions.len(),
                actual: dataset.len(),
            });
        }

        let header = Sample::CSV_HEADER.iter().chain(PREDICTION_COLUMNS.iter());
        writer.write_record(header)?;
        for (sample, prediction) in dataset.samples().iter().zip(&self.predictions) {
            let mut record = sample.csv_record();
            record.extend(prediction.csv_cells());
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Runs all four trainings over a dataset.
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    /// Create a trainer; fails on an invalid configuration.
    pub fn new(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Fit every model on `dataset`.
    pub fn train(&self, dataset: &Dataset) -> Result<TrainingOutcome> {
        let samples = dataset.samples();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let rows = feature_matrix(samples);
        info!(
            seed = self.config.seed,
            "Training on {} rows x {} features",
            rows.len(),
            FEATURE_COLUMNS.len()
        );

        let labels: Vec<bool> = samples.iter().map(|s| s.is_anomaly).collect();
        let detector = train_anomaly_detector(&rows, &labels, &self.config.detector, &mut rng)?;

        let anomalous: Vec<usize> = (0..samples.len()).filter(|&i| labels[i]).collect();
        let classifier = if anomalous.len() < MIN_CLASSIFIER_ROWS {
            warn!(
                rows = anomalous.len(),
                required = MIN_CLASSIFIER_ROWS,
                "Too few anomalous rows, skipping anomaly-type classifier"
            );
            None
        } else {
            let types: Vec<AnomalyType> =
                anomalous.iter().map(|&i| samples[i].anomaly_type).collect();
            match train_type_classifier(
                &take_rows(&rows, &anomalous),
                &types,
                &self.config.classifier,
                &mut rng,
            ) {
                Ok(fitted) => Some(fitted),
                Err(TrainerError::TooFewClasses { classes, .. }) => {
                    warn!(
                        classes,
                        "Anomalous rows span a single fault type, skipping anomaly-type classifier"
                    );
                    None
                }
                Err(e) => return Err(e),
            }
        };

        let days = dataset.column(|s| s.days_to_maintenance);
        let maintenance =
            train_maintenance_regressor(&rows, &days, &self.config.maintenance, &mut rng)?;

        let health_scores = dataset.column(|s| s.machine_health_score);
        let health =
            train_health_regressor(&rows, &health_scores, &self.config.health, &mut rng)?;

        let mut predictions: Vec<RowPrediction> = detector
            .scores
            .iter()
            .zip(&detector.predicted)
            .map(|(&anomaly_score, &predicted_anomaly)| RowPrediction {
                anomaly_score,
                predicted_anomaly,
                days_to_maintenance: None,
                health_score: None,
            })
            .collect();
        write_back(&mut predictions, &maintenance.predictions, |p, v| {
            p.days_to_maintenance = Some(v)
        });
        write_back(&mut predictions, &health.predictions, |p, v| p.health_score = Some(v));

        let (type_classifier, classifier_report) = match classifier {
            Some((model, report)) => (Some(model), Some(report)),
            None => (None, None),
        };

        let report = TrainingReport {
            trained_at: Utc::now(),
            seed: self.config.seed,
            rows: rows.len(),
            anomaly_rows: anomalous.len(),
            feature_columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            detector: detector.report,
            classifier: classifier_report,
            maintenance: maintenance.report,
            health: health.report,
        };
        info!(
            maintenance_model = %report.maintenance.selected,
            "Training complete"
        );

        Ok(TrainingOutcome {
            artifacts: ModelArtifacts {
                isolation_forest: detector.detector.forest,
                scaler_anomaly: detector.detector.scaler,
                type_classifier,
                maintenance: maintenance.model,
                scaler_x_maint: maintenance.x_scaler,
                scaler_y_maint: maintenance.y_scaler,
                health: health.model,
            },
            report,
            predictions,
        })
    }
}

fn write_back(
    predictions: &mut [RowPrediction],
    values: &[(usize, f64)],
    set: impl Fn(&mut RowPrediction, f64),
) {
    for &(row, value) in values {
        if let Some(prediction) = predictions.get_mut(row) {
            set(prediction, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank() -> RowPrediction {
        RowPrediction {
            anomaly_score: 0.1,
            predicted_anomaly: false,
            days_to_maintenance: None,
            health_score: None,
        }
    }

    #[test]
    fn test_write_back_exact_rows() {
        let mut predictions = vec![blank(); 5];
        write_back(&mut predictions, &[(1, 12.5), (4, 3.0)], |p, v| {
            p.days_to_maintenance = Some(v)
        });

        assert_eq!(predictions[1].days_to_maintenance, Some(12.5));
        assert_eq!(predictions[4].days_to_maintenance, Some(3.0));
        assert!(predictions
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 1 && *i != 4)
            .all(|(_, p)| p.days_to_maintenance.is_none()));
    }

    #[test]
    fn test_csv_cells_leave_gaps_empty() {
        let mut p = blank();
        p.predicted_anomaly = true;
        p.health_score = Some(87.5);
        assert_eq!(p.csv_cells(), ["0.1", "1", "", "87.5"]);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = TrainerConfig::default();
        config.maintenance.window = 0;
        assert!(Trainer::new(config).is_err());
    }
}
