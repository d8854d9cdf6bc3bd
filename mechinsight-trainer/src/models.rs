// MechInsight Trainer - Predictive-maintenance models
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! The four models fitted on CNC telemetry.
//!
//! - anomaly detector: standardized features, isolation forest
//! - anomaly-type classifier: random forest on anomalous rows
//! - maintenance regressor: ridge over trailing windows vs. a row forest
//! - health regressor: random forest on raw features
//!
//! Every fit returns its test-split predictions keyed by the dataset row they
//! belong to.

use crate::config::{
    ClassifierConfig, DetectorConfig, ForestParams, HealthModelConfig, MaintenanceConfig,
};
use crate::error::{Result, TrainerError};
use crate::isolation::{IsolationForest, IsolationForestConfig};
use crate::metrics::{accuracy, ClassScores, ClassificationReport, RegressionScores};
use crate::scaler::{MinMaxScaler, StandardScaler};
use crate::split::{quantile_bins, random_split, split_with_fallback};
use crate::table::{sequence_windows, take_rows};
use mechinsight::AnomalyType;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::ridge_regression::{RidgeRegression, RidgeRegressionParameters};
use std::collections::BTreeSet;
use tracing::info;

/// Random forest classifier over anomaly-type codes.
pub type TypeForest = RandomForestClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>>;

/// Random forest regressor.
pub type RegressionForest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Ridge regressor over flattened windows.
pub type SequenceRidge = RidgeRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Row-indexed predictions.
pub type RowPredictions = Vec<(usize, f64)>;

fn to_matrix(rows: &[Vec<f64>]) -> Result<DenseMatrix<f64>> {
    Ok(DenseMatrix::from_2d_vec(&rows.to_vec())?)
}

fn require_rows(task: &'static str, rows: usize, required: usize) -> Result<()> {
    if rows < required {
        return Err(TrainerError::InsufficientData {
            task,
            rows,
            required,
        });
    }
    Ok(())
}

fn require_classes<L: Ord>(task: &'static str, labels: &[L]) -> Result<()> {
    let classes = labels.iter().collect::<BTreeSet<_>>().len();
    if classes < 2 {
        return Err(TrainerError::TooFewClasses { task, classes });
    }
    Ok(())
}

fn regressor_params(params: &ForestParams, seed: u64) -> RandomForestRegressorParameters {
    let base = RandomForestRegressorParameters::default()
        .with_n_trees(params.n_trees.into())
        .with_min_samples_split(params.min_samples_split)
        .with_min_samples_leaf(params.min_samples_leaf)
        .with_seed(seed);
    match params.max_depth {
        Some(depth) => base.with_max_depth(depth),
        None => base,
    }
}

fn fit_regression_forest(
    rows: &[Vec<f64>],
    targets: &[f64],
    params: &ForestParams,
    seed: u64,
) -> Result<RegressionForest> {
    let x = to_matrix(rows)?;
    Ok(RandomForestRegressor::fit(
        &x,
        &targets.to_vec(),
        regressor_params(params, seed),
    )?)
}

// ---------------------------------------------------------------------------
// Anomaly detector
// ---------------------------------------------------------------------------

/// Standard scaler plus isolation forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyDetector {
    pub scaler: StandardScaler,
    pub forest: IsolationForest,
}

impl AnomalyDetector {
    /// Shifted scores for raw feature rows: positive = inlier.
    pub fn decision_function(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        self.forest.decision_function(&self.scaler.transform(rows)?)
    }

    /// Anomaly flags for raw feature rows.
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<bool>> {
        self.forest.predict(&self.scaler.transform(rows)?)
    }
}

/// Anomaly detector evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorReport {
    pub contamination: f64,
    pub train_rows: usize,
    pub test_rows: usize,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    /// Scores for the anomalous class on the test split.
    pub test_scores: ClassScores,
}

/// Fitted detector with scores for every row.
#[derive(Debug, Clone)]
pub struct DetectorOutcome {
    pub detector: AnomalyDetector,
    pub report: DetectorReport,
    /// Decision score per dataset row.
    pub scores: Vec<f64>,
    /// Anomaly flag per dataset row.
    pub predicted: Vec<bool>,
}

/// Fit the anomaly detector. Contamination is the observed anomaly rate.
pub fn train_anomaly_detector(
    rows: &[Vec<f64>],
    labels: &[bool],
    config: &DetectorConfig,
    rng: &mut impl Rng,
) -> Result<DetectorOutcome> {
    require_rows("anomaly detector", rows.len(), 2)?;

    let scaler = StandardScaler::fit(rows)?;
    let scaled = scaler.transform(rows)?;
    let split = random_split(rows.len(), config.test_fraction, rng)?;

    let rate = labels.iter().filter(|&&l| l).count() as f64 / labels.len() as f64;
    let contamination = (rate > 0.0).then_some(rate.min(0.5));
    info!(
        contamination = rate,
        "Training anomaly detector on {} rows",
        split.train.len()
    );

    let forest_config = IsolationForestConfig {
        n_trees: config.n_trees,
        max_samples: config.max_samples,
        contamination,
    };
    let forest = IsolationForest::fit(&take_rows(&scaled, &split.train), &forest_config, rng)?;

    let scores = forest.decision_function(&scaled)?;
    let predicted: Vec<bool> = scores.iter().map(|s| *s < 0.0).collect();

    let truth_of = |idx: &[usize]| take_rows(labels, idx);
    let pred_of = |idx: &[usize]| take_rows(&predicted, idx);
    let (test_truth, test_pred) = (truth_of(&split.test), pred_of(&split.test));

    let report = DetectorReport {
        contamination: rate,
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        train_accuracy: accuracy(&truth_of(&split.train), &pred_of(&split.train)),
        test_accuracy: accuracy(&test_truth, &test_pred),
        test_scores: ClassScores::compute(&test_truth, &test_pred, &true),
    };
    info!(
        test_accuracy = report.test_accuracy,
        f1 = report.test_scores.f1,
        "Anomaly detector trained"
    );

    Ok(DetectorOutcome {
        detector: AnomalyDetector { scaler, forest },
        report,
        scores,
        predicted,
    })
}

// ---------------------------------------------------------------------------
// Anomaly-type classifier
// ---------------------------------------------------------------------------

/// Random forest mapping feature rows to fault types.
#[derive(Debug, Serialize, Deserialize)]
pub struct TypeClassifier {
    /// Fault type of each class code.
    pub classes: Vec<AnomalyType>,
    pub model: TypeForest,
}

impl TypeClassifier {
    /// Predict fault types for raw feature rows.
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<AnomalyType>> {
        let codes = self.model.predict(&to_matrix(rows)?)?;
        codes
            .into_iter()
            .map(|c| {
                self.classes
                    .get(c as usize)
                    .copied()
                    .ok_or_else(|| TrainerError::Model(format!("unknown class code {}", c)))
            })
            .collect()
    }
}

fn type_code(classes: &[AnomalyType], anomaly_type: AnomalyType) -> Result<u32> {
    classes
        .iter()
        .position(|c| *c == anomaly_type)
        .map(|p| p as u32)
        .ok_or_else(|| TrainerError::Model(format!("unknown class {}", anomaly_type)))
}

/// Anomaly-type classifier evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierReport {
    /// False when the split fell back to unstratified.
    pub stratified: bool,
    pub train_rows: usize,
    pub test_rows: usize,
    pub test: ClassificationReport,
}

/// Fit the fault-type classifier on anomalous rows only.
pub fn train_type_classifier(
    rows: &[Vec<f64>],
    labels: &[AnomalyType],
    config: &ClassifierConfig,
    rng: &mut impl Rng,
) -> Result<(TypeClassifier, ClassifierReport)> {
    const TASK: &str = "anomaly-type classifier";
    require_rows(TASK, rows.len(), 2)?;
    require_classes(TASK, labels)?;

    let (split, stratified) = split_with_fallback(labels, config.test_fraction, rng)?;
    require_classes(TASK, &take_rows(labels, &split.train))?;
    let classes: Vec<AnomalyType> = AnomalyType::CATALOG.to_vec();
    let codes = labels
        .iter()
        .map(|l| type_code(&classes, *l))
        .collect::<Result<Vec<u32>>>()?;

    info!(
        stratified,
        "Training anomaly-type classifier on {} rows",
        split.train.len()
    );

    let params = &config.forest;
    let mut forest_params = RandomForestClassifierParameters::default()
        .with_n_trees(params.n_trees.into())
        .with_min_samples_split(params.min_samples_split)
        .with_min_samples_leaf(params.min_samples_leaf)
        .with_seed(rng.gen());
    if let Some(depth) = params.max_depth {
        forest_params = forest_params.with_max_depth(depth);
    }

    let model = RandomForestClassifier::fit(
        &to_matrix(&take_rows(rows, &split.train))?,
        &take_rows(&codes, &split.train),
        forest_params,
    )?;
    let classifier = TypeClassifier { classes, model };

    let predicted = classifier.predict(&take_rows(rows, &split.test))?;
    let truth = take_rows(labels, &split.test);
    let truth_labels: Vec<&str> = truth.iter().map(|t| t.label()).collect();
    let predicted_labels: Vec<&str> = predicted.iter().map(|t| t.label()).collect();

    let report = ClassifierReport {
        stratified,
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        test: ClassificationReport::compute(&truth_labels, &predicted_labels),
    };
    info!(accuracy = report.test.accuracy, "Anomaly-type classifier trained");

    Ok((classifier, report))
}

// ---------------------------------------------------------------------------
// Maintenance regressor
// ---------------------------------------------------------------------------

/// Selected days-to-maintenance model. Both variants work on min-max scaled
/// features and targets.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaintenanceModel {
    /// Ridge over `window` consecutive rows predicting the next row.
    Sequence { window: usize, model: SequenceRidge },
    /// Random forest on single rows.
    RandomForest { model: RegressionForest },
}

impl MaintenanceModel {
    /// Short name used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            MaintenanceModel::Sequence { .. } => "sequence",
            MaintenanceModel::RandomForest { .. } => "random_forest",
        }
    }

    /// Predict scaled targets for every row that has enough history.
    pub fn predict_rows(&self, scaled_rows: &[Vec<f64>]) -> Result<RowPredictions> {
        match self {
            MaintenanceModel::Sequence { window, model } => {
                let placeholder = vec![0.0; scaled_rows.len()];
                let (windows, _) = sequence_windows(scaled_rows, &placeholder, *window);
                if windows.is_empty() {
                    return Ok(Vec::new());
                }
                let predicted = model.predict(&to_matrix(&windows)?)?;
                Ok(predicted
                    .into_iter()
                    .enumerate()
                    .map(|(i, p)| (i + window, p))
                    .collect())
            }
            MaintenanceModel::RandomForest { model } => {
                let predicted = model.predict(&to_matrix(scaled_rows)?)?;
                Ok(predicted.into_iter().enumerate().collect())
            }
        }
    }
}

/// Maintenance regressor evaluation, in days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceReport {
    /// `sequence` or `random_forest`.
    pub selected: String,
    pub window: usize,
    /// False when the sequence split fell back to unstratified.
    pub stratified: bool,
    pub sequence: RegressionScores,
    pub random_forest: RegressionScores,
}

/// Fitted maintenance model with its scalers.
#[derive(Debug)]
pub struct MaintenanceOutcome {
    pub model: MaintenanceModel,
    pub x_scaler: MinMaxScaler,
    pub y_scaler: MinMaxScaler,
    pub report: MaintenanceReport,
    /// Test-split predictions in days.
    pub predictions: RowPredictions,
}

/// Fit both maintenance regressors and keep the one with higher R² in days.
pub fn train_maintenance_regressor(
    rows: &[Vec<f64>],
    days: &[f64],
    config: &MaintenanceConfig,
    rng: &mut impl Rng,
) -> Result<MaintenanceOutcome> {
    let window = config.window;
    require_rows("maintenance regressor", rows.len(), window + 2)?;

    let x_scaler = MinMaxScaler::fit(rows)?;
    let y_scaler = MinMaxScaler::fit_column(days)?;
    let x = x_scaler.transform(rows)?;
    let y = y_scaler.transform_column(days);

    // Sequence model
    let (windows, targets) = sequence_windows(&x, &y, window);
    let bins = quantile_bins(&targets, config.n_bins);
    let (seq_split, stratified) = split_with_fallback(&bins, config.test_fraction, rng)?;
    info!(
        windows = windows.len(),
        stratified, "Training sequence maintenance model"
    );

    let ridge = RidgeRegression::fit(
        &to_matrix(&take_rows(&windows, &seq_split.train))?,
        &take_rows(&targets, &seq_split.train),
        RidgeRegressionParameters::default()
            .with_alpha(config.ridge_alpha)
            .with_normalize(false),
    )?;
    let seq_pred = y_scaler.inverse_column(&ridge.predict(&to_matrix(&take_rows(
        &windows,
        &seq_split.test,
    ))?)?);
    let seq_truth = y_scaler.inverse_column(&take_rows(&targets, &seq_split.test));
    let sequence_scores = RegressionScores::compute(&seq_truth, &seq_pred);

    // Single-row forest
    let rf_split = random_split(rows.len(), config.test_fraction, rng)?;
    info!("Training random forest maintenance model");
    let forest = fit_regression_forest(
        &take_rows(&x, &rf_split.train),
        &take_rows(&y, &rf_split.train),
        &config.forest,
        rng.gen(),
    )?;
    let rf_pred =
        y_scaler.inverse_column(&forest.predict(&to_matrix(&take_rows(&x, &rf_split.test))?)?);
    let rf_truth = take_rows(days, &rf_split.test);
    let forest_scores = RegressionScores::compute(&rf_truth, &rf_pred);

    info!(
        sequence_r2 = sequence_scores.r2,
        sequence_rmse = sequence_scores.rmse,
        forest_r2 = forest_scores.r2,
        forest_rmse = forest_scores.rmse,
        "Maintenance models evaluated"
    );

    let (model, predictions) = if forest_scores.r2 > sequence_scores.r2 {
        let indexed: RowPredictions = rf_split.test.iter().copied().zip(rf_pred).collect();
        (MaintenanceModel::RandomForest { model: forest }, indexed)
    } else {
        // Window i predicts the row right after it
        let indexed: RowPredictions = seq_split
            .test
            .iter()
            .map(|i| i + window)
            .zip(seq_pred)
            .collect();
        (MaintenanceModel::Sequence { window, model: ridge }, indexed)
    };
    info!(selected = model.kind(), "Maintenance model selected");

    Ok(MaintenanceOutcome {
        report: MaintenanceReport {
            selected: model.kind().to_string(),
            window,
            stratified,
            sequence: sequence_scores,
            random_forest: forest_scores,
        },
        model,
        x_scaler,
        y_scaler,
        predictions,
    })
}

// ---------------------------------------------------------------------------
// Health regressor
// ---------------------------------------------------------------------------

/// Health regressor evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub train_rows: usize,
    pub test_rows: usize,
    pub test: RegressionScores,
}

/// Fitted health regressor.
#[derive(Debug)]
pub struct HealthOutcome {
    pub model: RegressionForest,
    pub report: HealthReport,
    /// Test-split predictions.
    pub predictions: RowPredictions,
}

/// Fit the health-score forest on raw features.
pub fn train_health_regressor(
    rows: &[Vec<f64>],
    health: &[f64],
    config: &HealthModelConfig,
    rng: &mut impl Rng,
) -> Result<HealthOutcome> {
    require_rows("health regressor", rows.len(), 2)?;

    let split = random_split(rows.len(), config.test_fraction, rng)?;
    info!("Training health regressor on {} rows", split.train.len());

    let model = fit_regression_forest(
        &take_rows(rows, &split.train),
        &take_rows(health, &split.train),
        &config.forest,
        rng.gen(),
    )?;
    let predicted = model.predict(&to_matrix(&take_rows(rows, &split.test))?)?;
    let truth = take_rows(health, &split.test);
    let scores = RegressionScores::compute(&truth, &predicted);
    info!(r2 = scores.r2, rmse = scores.rmse, "Health regressor trained");

    Ok(HealthOutcome {
        model,
        report: HealthReport {
            train_rows: split.train.len(),
            test_rows: split.test.len(),
            test: scores,
        },
        predictions: split.test.iter().copied().zip(predicted).collect(),
    })
}
