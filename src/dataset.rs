// MechInsight - Dataset structures
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Dataset structures and I/O operations.
//!
//! Provides the `Dataset` type for storing and exporting generated telemetry.

use crate::error::{GeneratorError, Result};
use crate::sample::Sample;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// A generated telemetry table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Hourly samples ordered by timestamp.
    pub samples: Vec<Sample>,
    /// Metadata.
    #[serde(default)]
    pub metadata: DatasetMetadata,
}

/// Dataset metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// Dataset name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Generation seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Sample interval in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_interval_ms: Option<u64>,
}

impl Dataset {
    /// Wrap a sample sequence.
    pub fn new(samples: Vec<Sample>) -> Self {
        Self {
            samples,
            metadata: DatasetMetadata::default(),
        }
    }

    /// Get all samples.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Get number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Set name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.metadata.name = Some(name.to_string());
        self
    }

    /// Set description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.metadata.description = Some(description.to_string());
        self
    }

    /// Extract a numeric column.
    pub fn column(&self, f: impl Fn(&Sample) -> f64) -> Vec<f64> {
        self.samples.iter().map(f).collect()
    }

    /// Number of anomalous samples.
    pub fn anomaly_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_anomaly).count()
    }

    /// Export to CSV file.
    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path)?;
        self.write_csv(&mut writer)?;
        info!("Wrote {} samples to {}", self.len(), path.display());
        Ok(())
    }

    /// Write the CSV table to any writer.
    pub fn write_csv<W: std::io::Write>(&self, writer: &mut csv::Writer<W>) -> Result<()> {
        writer.write_record(Sample::CSV_HEADER)?;
        for sample in &self.samples {
            writer.write_record(sample.csv_record())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Import from CSV file.
    ///
    /// Columns are matched by header name; extra columns are ignored.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut samples = Vec::new();

        for (line_num, result) in reader.deserialize::<Sample>().enumerate() {
            let sample = result.map_err(|e| GeneratorError::CsvParse {
                line: line_num + 2,
                message: e.to_string(),
            })?;
            samples.push(sample);
        }

        if samples.is_empty() {
            return Err(GeneratorError::Empty);
        }

        Ok(Self::new(samples))
    }

    /// Calculate basic statistics for a column.
    pub fn stats(&self, f: impl Fn(&Sample) -> f64) -> Option<ColumnStats> {
        ColumnStats::from_values(&self.column(f))
    }

    /// Pearson correlation between two columns (None if either is constant).
    pub fn correlation(
        &self,
        a: impl Fn(&Sample) -> f64,
        b: impl Fn(&Sample) -> f64,
    ) -> Option<f64> {
        pearson(&self.column(a), &self.column(b))
    }
}

/// Basic statistics for a column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl ColumnStats {
    /// Population statistics of a slice (None if empty).
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        Some(Self {
            count,
            mean,
            std_dev: variance.sqrt(),
            min: values.iter().cloned().fold(f64::INFINITY, f64::min),
            max: values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

/// Pearson correlation coefficient.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a[..n].iter().zip(&b[..n]) {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }

    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}
