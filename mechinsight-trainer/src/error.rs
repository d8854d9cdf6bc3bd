// MechInsight Trainer - Predictive-maintenance models
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for MechInsight Trainer

use thiserror::Error;

/// Main error type for training operations
#[derive(Error, Debug)]
pub enum TrainerError {
    /// Dataset loading or validation failed
    #[error("Dataset error: {0}")]
    Dataset(#[from] mechinsight::GeneratorError),

    /// Not enough rows to fit a model
    #[error("Insufficient data for {task}: {rows} rows (need {required})")]
    InsufficientData {
        task: &'static str,
        rows: usize,
        required: usize,
    },

    /// A classifier needs at least two classes
    #[error("Too few classes for {task}: {classes} (need 2)")]
    TooFewClasses { task: &'static str, classes: usize },

    /// Stratified split is impossible for the given labels
    #[error("Cannot stratify: {0}")]
    Split(String),

    /// Model fitting or prediction failed
    #[error("Model error: {0}")]
    Model(String),

    /// Feature dimension mismatch
    #[error("Feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<smartcore::error::Failed> for TrainerError {
    fn from(err: smartcore::error::Failed) -> Self {
        TrainerError::Model(err.to_string())
    }
}

/// Result type alias for training operations
pub type Result<T> = std::result::Result<T, TrainerError>;
