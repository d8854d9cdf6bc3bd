// MechInsight Trainer - Predictive-maintenance models
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Column scalers.
//!
//! Both scalers leave constant columns unscaled (unit divisor), so a
//! zero-variance column is only centred.

use crate::error::{Result, TrainerError};
use serde::{Deserialize, Serialize};

fn check_width(expected: usize, row: &[f64]) -> Result<()> {
    if row.len() != expected {
        return Err(TrainerError::DimensionMismatch {
            expected,
            actual: row.len(),
        });
    }
    Ok(())
}

fn unit_if_zero(scale: f64) -> f64 {
    if scale.abs() < f64::EPSILON {
        1.0
    } else {
        scale
    }
}

/// Z-score scaler using population statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Per-column means.
    pub means: Vec<f64>,
    /// Per-column standard deviations (1 for constant columns).
    pub std_devs: Vec<f64>,
}

impl StandardScaler {
    /// Fit column statistics.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let first = rows.first().ok_or(TrainerError::InsufficientData {
            task: "standard scaler",
            rows: 0,
            required: 1,
        })?;
        let width = first.len();
        let n = rows.len() as f64;

        let mut means = vec![0.0; width];
        for row in rows {
            check_width(width, row)?;
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut std_devs = vec![0.0; width];
        for row in rows {
            for ((s, v), m) in std_devs.iter_mut().zip(row).zip(&means) {
                *s += (v - m).powi(2);
            }
        }
        for s in &mut std_devs {
            *s = unit_if_zero((*s / n).sqrt());
        }

        Ok(Self { means, std_devs })
    }

    /// Scale one row.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        check_width(self.means.len(), row)?;
        Ok(row
            .iter()
            .zip(self.means.iter().zip(&self.std_devs))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }

    /// Scale every row.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }
}

/// Min-max scaler onto [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    /// Per-column minimum.
    pub mins: Vec<f64>,
    /// Per-column range (1 for constant columns).
    pub ranges: Vec<f64>,
}

impl MinMaxScaler {
    /// Fit column ranges.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let first = rows.first().ok_or(TrainerError::InsufficientData {
            task: "min-max scaler",
            rows: 0,
            required: 1,
        })?;
        let width = first.len();

        let mut mins = vec![f64::INFINITY; width];
        let mut maxs = vec![f64::NEG_INFINITY; width];
        for row in rows {
            check_width(width, row)?;
            for (i, v) in row.iter().enumerate() {
                mins[i] = mins[i].min(*v);
                maxs[i] = maxs[i].max(*v);
            }
        }

        let ranges = mins
            .iter()
            .zip(&maxs)
            .map(|(lo, hi)| unit_if_zero(hi - lo))
            .collect();
        Ok(Self { mins, ranges })
    }

    /// Fit a single-column scaler.
    pub fn fit_column(values: &[f64]) -> Result<Self> {
        let rows: Vec<Vec<f64>> = values.iter().map(|v| vec![*v]).collect();
        Self::fit(&rows)
    }

    /// Scale one row.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        check_width(self.mins.len(), row)?;
        Ok(row
            .iter()
            .zip(self.mins.iter().zip(&self.ranges))
            .map(|(v, (lo, r))| (v - lo) / r)
            .collect())
    }

    /// Scale every row.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }

    /// Scale a column with a single-column scaler.
    pub fn transform_column(&self, values: &[f64]) -> Vec<f64> {
        let (lo, r) = (self.mins[0], self.ranges[0]);
        values.iter().map(|v| (v - lo) / r).collect()
    }

    /// Undo [`MinMaxScaler::transform_column`].
    pub fn inverse_column(&self, values: &[f64]) -> Vec<f64> {
        let (lo, r) = (self.mins[0], self.ranges[0]);
        values.iter().map(|v| v * r + lo).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rows() -> Vec<Vec<f64>> {
        vec![
            vec![1.0, 10.0, 5.0],
            vec![2.0, 20.0, 5.0],
            vec![3.0, 30.0, 5.0],
        ]
    }

    #[test]
    fn test_standard_scaler() {
        let scaler = StandardScaler::fit(&rows()).unwrap();
        assert_relative_eq!(scaler.means[0], 2.0);
        assert_relative_eq!(scaler.std_devs[0], (2.0f64 / 3.0).sqrt());

        let scaled = scaler.transform(&rows()).unwrap();
        let col0: f64 = scaled.iter().map(|r| r[0]).sum();
        assert_relative_eq!(col0, 0.0, epsilon = 1e-12);
        // Constant column is centred, not blown up
        assert!(scaled.iter().all(|r| r[2] == 0.0));
    }

    #[test]
    fn test_minmax_scaler() {
        let scaler = MinMaxScaler::fit(&rows()).unwrap();
        let scaled = scaler.transform(&rows()).unwrap();
        assert_eq!(scaled[0][1], 0.0);
        assert_eq!(scaled[2][1], 1.0);
        assert_relative_eq!(scaled[1][0], 0.5);
        assert!(scaled.iter().all(|r| r[2] == 0.0));
    }

    #[test]
    fn test_column_roundtrip() {
        let values = [0.0, 7.5, 30.0];
        let scaler = MinMaxScaler::fit_column(&values).unwrap();
        let scaled = scaler.transform_column(&values);
        assert_eq!(scaled, vec![0.0, 0.25, 1.0]);
        assert_eq!(scaler.inverse_column(&scaled), values.to_vec());
    }

    #[test]
    fn test_dimension_mismatch() {
        let scaler = StandardScaler::fit(&rows()).unwrap();
        assert!(matches!(
            scaler.transform_row(&[1.0]),
            Err(TrainerError::DimensionMismatch { expected: 3, actual: 1 })
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(StandardScaler::fit(&[]).is_err());
        assert!(MinMaxScaler::fit(&[]).is_err());
    }
}
