// MechInsight - Synthetic CNC telemetry
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for dataset generation and I/O.

use thiserror::Error;

/// Main error type for generator operations
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// Configuration cannot produce a valid dataset
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No free slot found for an anomaly episode
    #[error("Could not place {length}-sample episode after {attempts} attempts")]
    PlacementExhausted { length: usize, attempts: usize },

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed row in an input table
    #[error("CSV parse error at line {line}: {message}")]
    CsvParse { line: usize, message: String },

    /// Input table has no rows
    #[error("Empty dataset")]
    Empty,
}

/// Result type alias for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;
