// MechInsight Trainer - Integration tests
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

use approx::assert_relative_eq;
use mechinsight::{generate_dataset, Dataset, GeneratorConfig};
use mechinsight_trainer::artifacts::{
    HEALTH_FILE, ISOLATION_FOREST_FILE, MAINTENANCE_FILE, REPORT_FILE, SCALER_ANOMALY_FILE,
    SCALER_X_MAINT_FILE, SCALER_Y_MAINT_FILE, TYPE_CLASSIFIER_FILE,
};
use mechinsight_trainer::{
    feature_matrix, ModelArtifacts, Trainer, TrainerConfig, TrainerError, TrainingReport,
    PREDICTION_COLUMNS,
};
use tempfile::TempDir;

const WINDOW: usize = 12;

fn dataset(anomaly_percentage: f64) -> Dataset {
    let config = GeneratorConfig::new()
        .with_num_days(30)
        .with_seed(3)
        .with_anomaly_percentage(anomaly_percentage);
    generate_dataset(&config).unwrap().dataset
}

fn trainer() -> Trainer {
    Trainer::new(TrainerConfig::fast().with_window(WINDOW)).unwrap()
}

#[test]
fn test_training_report() {
    let data = dataset(0.1);
    let outcome = trainer().train(&data).unwrap();
    let report = &outcome.report;

    assert_eq!(report.rows, 720);
    assert_eq!(report.anomaly_rows, 72);
    assert_eq!(report.feature_columns.len(), 20);
    assert_relative_eq!(report.detector.contamination, 0.1);
    assert_eq!(report.detector.test_rows, 144);

    let classifier = report.classifier.as_ref().unwrap();
    assert_eq!(classifier.train_rows + classifier.test_rows, 72);
    assert!(outcome.artifacts.type_classifier.is_some());

    assert_eq!(report.maintenance.window, WINDOW);
    assert!(["sequence", "random_forest"].contains(&report.maintenance.selected.as_str()));
    assert_eq!(report.maintenance.selected, outcome.artifacts.maintenance.kind());
    assert_eq!(report.health.test_rows, 144);
}

#[test]
fn test_predictions_land_on_test_rows() {
    let data = dataset(0.1);
    let outcome = trainer().train(&data).unwrap();
    let predictions = &outcome.predictions;
    assert_eq!(predictions.len(), data.len());

    let health_rows: Vec<usize> = (0..predictions.len())
        .filter(|&i| predictions[i].health_score.is_some())
        .collect();
    assert_eq!(health_rows.len(), outcome.report.health.test_rows);

    let maintenance_rows: Vec<usize> = (0..predictions.len())
        .filter(|&i| predictions[i].days_to_maintenance.is_some())
        .collect();
    if outcome.report.maintenance.selected == "sequence" {
        // ceil(0.2 * (720 - 12)) windows, each predicting the row after it
        assert_eq!(maintenance_rows.len(), 142);
        assert!(maintenance_rows.iter().all(|&i| i >= WINDOW));
    } else {
        assert_eq!(maintenance_rows.len(), 144);
    }

    // Anomaly scores and flags cover every row
    for p in predictions {
        assert_eq!(p.predicted_anomaly, p.anomaly_score < 0.0);
    }
}

#[test]
fn test_same_seed_same_predictions() {
    let data = dataset(0.1);
    let first = trainer().train(&data).unwrap();
    let second = trainer().train(&data).unwrap();
    assert_eq!(first.predictions, second.predictions);
    assert_eq!(
        first.report.maintenance.selected,
        second.report.maintenance.selected
    );
}

#[test]
fn test_artifacts_roundtrip() {
    let data = dataset(0.1);
    let outcome = trainer().train(&data).unwrap();
    let dir = TempDir::new().unwrap();
    let models = dir.path().join("models");
    outcome.save(&models).unwrap();

    for name in [
        ISOLATION_FOREST_FILE,
        TYPE_CLASSIFIER_FILE,
        MAINTENANCE_FILE,
        HEALTH_FILE,
        SCALER_ANOMALY_FILE,
        SCALER_X_MAINT_FILE,
        SCALER_Y_MAINT_FILE,
        REPORT_FILE,
    ] {
        assert!(models.join(name).exists(), "missing {}", name);
    }

    let loaded = ModelArtifacts::load(&models).unwrap();
    let rows = feature_matrix(data.samples());
    let scaled = loaded.scaler_anomaly.transform(&rows).unwrap();
    let scores = loaded.isolation_forest.decision_function(&scaled).unwrap();
    for (loaded_score, p) in scores.iter().zip(&outcome.predictions) {
        assert_relative_eq!(*loaded_score, p.anomaly_score, epsilon = 1e-9);
    }

    let classifier = loaded.type_classifier.unwrap();
    assert_eq!(classifier.predict(&rows[..10]).unwrap().len(), 10);

    let report: TrainingReport =
        serde_json::from_reader(std::fs::File::open(models.join(REPORT_FILE)).unwrap()).unwrap();
    assert_eq!(report.rows, 720);
}

#[test]
fn test_predictions_csv() {
    let data = dataset(0.1);
    let outcome = trainer().train(&data).unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cnc_machine_predictions.csv");
    outcome.write_predictions(&data, &path).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), 28);
    let tail: Vec<&str> = headers.iter().skip(24).collect();
    assert_eq!(tail, PREDICTION_COLUMNS);

    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 720);
    let empty_health = records.iter().filter(|r| r[27].is_empty()).count();
    assert_eq!(empty_health, 720 - outcome.report.health.test_rows);
    assert!(records.iter().all(|r| &r[25] == "0" || &r[25] == "1"));

    // The dataset columns still parse as a dataset
    let reloaded = Dataset::from_csv(&path).unwrap();
    assert_eq!(reloaded.len(), 720);
}

#[test]
fn test_no_anomalies_skips_classifier() {
    let data = dataset(0.0);
    let outcome = trainer().train(&data).unwrap();

    assert_eq!(outcome.report.anomaly_rows, 0);
    assert!(outcome.report.classifier.is_none());
    assert!(outcome.artifacts.type_classifier.is_none());

    let dir = TempDir::new().unwrap();
    outcome.save(dir.path()).unwrap();
    assert!(!dir.path().join(TYPE_CLASSIFIER_FILE).exists());
    assert!(ModelArtifacts::load(dir.path()).unwrap().type_classifier.is_none());
}

#[test]
fn test_single_fault_type_skips_classifier() {
    let config = GeneratorConfig::new()
        .with_num_days(30)
        .with_seed(3)
        .with_anomaly_percentage(0.01);
    let generated = generate_dataset(&config).unwrap();
    assert_eq!(generated.episodes.len(), 1);

    let data = generated.dataset;
    let outcome = trainer().train(&data).unwrap();
    assert!(outcome.report.anomaly_rows >= 4);
    assert!(outcome.report.classifier.is_none());
    assert!(outcome.artifacts.type_classifier.is_none());
    assert_eq!(outcome.predictions.len(), data.len());
    assert_eq!(outcome.report.health.test_rows, 144);
}

#[test]
fn test_stale_classifier_removed_on_save() {
    let dir = TempDir::new().unwrap();
    trainer().train(&dataset(0.1)).unwrap().save(dir.path()).unwrap();
    assert!(dir.path().join(TYPE_CLASSIFIER_FILE).exists());

    trainer().train(&dataset(0.0)).unwrap().save(dir.path()).unwrap();
    assert!(!dir.path().join(TYPE_CLASSIFIER_FILE).exists());
    assert!(ModelArtifacts::load(dir.path()).unwrap().type_classifier.is_none());
}

#[test]
fn test_too_few_rows_for_window() {
    let data = dataset(0.0);
    let short = Dataset::new(data.samples()[..30].to_vec());
    let trainer = Trainer::new(TrainerConfig::fast()).unwrap();

    assert!(matches!(
        trainer.train(&short),
        Err(TrainerError::InsufficientData {
            task: "maintenance regressor",
            ..
        })
    ));
}

#[test]
fn test_prediction_length_mismatch() {
    let data = dataset(0.1);
    let outcome = trainer().train(&data).unwrap();
    let short = Dataset::new(data.samples()[..10].to_vec());
    let dir = TempDir::new().unwrap();

    assert!(matches!(
        outcome.write_predictions(&short, dir.path().join("p.csv")),
        Err(TrainerError::DimensionMismatch { .. })
    ));
}
