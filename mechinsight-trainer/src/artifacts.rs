// MechInsight Trainer - Predictive-maintenance models
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! JSON model artifacts.

use crate::error::Result;
use crate::isolation::IsolationForest;
use crate::models::{MaintenanceModel, RegressionForest, TypeClassifier};
use crate::scaler::{MinMaxScaler, StandardScaler};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const ISOLATION_FOREST_FILE: &str = "isolation_forest_model.json";
pub const TYPE_CLASSIFIER_FILE: &str = "anomaly_type_classifier.json";
pub const MAINTENANCE_FILE: &str = "maintenance_predictor.json";
pub const HEALTH_FILE: &str = "health_score_predictor.json";
pub const SCALER_ANOMALY_FILE: &str = "scaler_anomaly.json";
pub const SCALER_X_MAINT_FILE: &str = "scaler_x_maint.json";
pub const SCALER_Y_MAINT_FILE: &str = "scaler_y_maint.json";
pub const REPORT_FILE: &str = "training_report.json";

/// Write `value` as JSON to `dir/name`.
pub fn save_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    let path = dir.join(name);
    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    debug!("Wrote artifact {}", path.display());
    Ok(path)
}

/// Read JSON from `dir/name`.
pub fn load_json<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<T> {
    let reader = BufReader::new(File::open(dir.join(name))?);
    Ok(serde_json::from_reader(reader)?)
}

/// Every fitted model and scaler, as stored on disk.
#[derive(Debug)]
pub struct ModelArtifacts {
    pub isolation_forest: IsolationForest,
    pub scaler_anomaly: StandardScaler,
    /// Absent when the dataset had too few anomalies to train on.
    pub type_classifier: Option<TypeClassifier>,
    pub maintenance: MaintenanceModel,
    pub scaler_x_maint: MinMaxScaler,
    pub scaler_y_maint: MinMaxScaler,
    pub health: RegressionForest,
}

impl ModelArtifacts {
    /// Write all artifacts into `dir`, creating it if needed.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        save_json(dir, ISOLATION_FOREST_FILE, &self.isolation_forest)?;
        save_json(dir, SCALER_ANOMALY_FILE, &self.scaler_anomaly)?;
        match &self.type_classifier {
            Some(classifier) => {
                save_json(dir, TYPE_CLASSIFIER_FILE, classifier)?;
            }
            None => {
                // Drop a classifier left by an earlier run
                let stale = dir.join(TYPE_CLASSIFIER_FILE);
                if stale.exists() {
                    std::fs::remove_file(&stale)?;
                    debug!("Removed stale {}", stale.display());
                }
            }
        }
        save_json(dir, MAINTENANCE_FILE, &self.maintenance)?;
        save_json(dir, SCALER_X_MAINT_FILE, &self.scaler_x_maint)?;
        save_json(dir, SCALER_Y_MAINT_FILE, &self.scaler_y_maint)?;
        save_json(dir, HEALTH_FILE, &self.health)?;
        info!("Saved model artifacts to {}", dir.display());
        Ok(())
    }

    /// Read all artifacts from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let type_classifier = if dir.join(TYPE_CLASSIFIER_FILE).exists() {
            Some(load_json(dir, TYPE_CLASSIFIER_FILE)?)
        } else {
            None
        };
        Ok(Self {
            isolation_forest: load_json(dir, ISOLATION_FOREST_FILE)?,
            scaler_anomaly: load_json(dir, SCALER_ANOMALY_FILE)?,
            type_classifier,
            maintenance: load_json(dir, MAINTENANCE_FILE)?,
            scaler_x_maint: load_json(dir, SCALER_X_MAINT_FILE)?,
            scaler_y_maint: load_json(dir, SCALER_Y_MAINT_FILE)?,
            health: load_json(dir, HEALTH_FILE)?,
        })
    }
}
