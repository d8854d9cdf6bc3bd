// MechInsight Trainer - Predictive-maintenance models
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Evaluation metrics for classifiers and regressors.
//!
//! Accuracy, MSE and R² come from `smartcore::metrics`; per-class precision,
//! recall and F1 are computed here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dense class codes for two label slices, shared across both.
fn encode_labels<T: Ord>(truth: &[T], predicted: &[T]) -> (Vec<i64>, Vec<i64>) {
    let mut labels: Vec<&T> = truth.iter().chain(predicted).collect();
    labels.sort();
    labels.dedup();
    let code = |v: &T| labels.binary_search(&v).map(|i| i as i64).unwrap_or(-1);
    (
        truth.iter().map(code).collect(),
        predicted.iter().map(code).collect(),
    )
}

/// Fraction of matching labels.
pub fn accuracy<T: Ord>(truth: &[T], predicted: &[T]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let (truth, predicted) = encode_labels(truth, predicted);
    smartcore::metrics::accuracy(&truth, &predicted)
}

/// Mean squared error.
pub fn mean_squared_error(truth: &[f64], predicted: &[f64]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    smartcore::metrics::mean_squared_error(&truth.to_vec(), &predicted.to_vec())
}

/// Coefficient of determination. A constant target yields 0 unless the
/// prediction is perfect.
pub fn r2_score(truth: &[f64], predicted: &[f64]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let first = truth[0];
    if truth.iter().all(|t| *t == first) {
        let exact = truth.iter().zip(predicted).all(|(t, p)| t == p);
        return if exact { 1.0 } else { 0.0 };
    }
    smartcore::metrics::r2(&truth.to_vec(), &predicted.to_vec())
}

/// Regression scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionScores {
    pub mse: f64,
    pub rmse: f64,
    pub r2: f64,
}

impl RegressionScores {
    pub fn compute(truth: &[f64], predicted: &[f64]) -> Self {
        let mse = mean_squared_error(truth, predicted);
        Self {
            mse,
            rmse: mse.sqrt(),
            r2: r2_score(truth, predicted),
        }
    }
}

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of true rows of this class.
    pub support: usize,
}

impl ClassScores {
    /// Scores for `class` treated as the positive label.
    pub fn compute<T: PartialEq>(truth: &[T], predicted: &[T], class: &T) -> Self {
        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut fn_ = 0usize;
        for (t, p) in truth.iter().zip(predicted) {
            match (t == class, p == class) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fn_ += 1,
                (false, false) => {}
            }
        }

        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };

        Self {
            precision,
            recall,
            f1,
            support: tp + fn_,
        }
    }
}

/// Per-class scores keyed by label, plus overall accuracy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub classes: BTreeMap<String, ClassScores>,
}

impl ClassificationReport {
    pub fn compute<T: Ord + ToString>(truth: &[T], predicted: &[T]) -> Self {
        let mut labels: Vec<&T> = truth.iter().chain(predicted).collect();
        labels.sort();
        labels.dedup();

        Self {
            accuracy: accuracy(truth, predicted),
            classes: labels
                .into_iter()
                .map(|l| (l.to_string(), ClassScores::compute(truth, predicted, l)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[1, 0, 1, 1], &[1, 0, 0, 1]), 0.75);
        assert_eq!(accuracy::<u8>(&[], &[]), 0.0);
        assert_eq!(accuracy(&[true, false], &[true, true]), 0.5);
        assert_eq!(accuracy(&["b", "a"], &["c", "a"]), 0.5);
    }

    #[test]
    fn test_regression_scores() {
        let truth = [1.0, 2.0, 3.0, 4.0];
        let scores = RegressionScores::compute(&truth, &[1.0, 2.0, 3.0, 5.0]);
        assert_relative_eq!(scores.mse, 0.25);
        assert_relative_eq!(scores.rmse, 0.5);
        assert_relative_eq!(scores.r2, 1.0 - 1.0 / 5.0);
    }

    #[test]
    fn test_r2_constant_target() {
        assert_eq!(r2_score(&[2.0, 2.0], &[2.0, 2.0]), 1.0);
        assert_eq!(r2_score(&[2.0, 2.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_class_scores() {
        let truth = [true, true, false, false, true];
        let predicted = [true, false, true, false, true];
        let s = ClassScores::compute(&truth, &predicted, &true);
        assert_relative_eq!(s.precision, 2.0 / 3.0);
        assert_relative_eq!(s.recall, 2.0 / 3.0);
        assert_relative_eq!(s.f1, 2.0 / 3.0);
        assert_eq!(s.support, 3);
    }

    #[test]
    fn test_classification_report() {
        let truth = ["a", "b", "b", "c"];
        let predicted = ["a", "b", "c", "c"];
        let report = ClassificationReport::compute(&truth, &predicted);
        assert_eq!(report.accuracy, 0.75);
        assert_eq!(report.classes.len(), 3);
        assert_eq!(report.classes["b"].recall, 0.5);
        assert_eq!(report.classes["c"].precision, 0.5);
    }
}
