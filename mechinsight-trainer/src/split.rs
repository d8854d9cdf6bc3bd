// MechInsight Trainer - Predictive-maintenance models
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Train/test splitting.
//!
//! Splits work on row indices so predictions can be written back to the
//! exact rows they were made for.

use crate::error::{Result, TrainerError};
use rand::prelude::*;
use std::collections::BTreeMap;
use tracing::warn;

/// Row indices of a train/test split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl Split {
    /// Total number of rows.
    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Test rows for a split of `n` rows (rounded up).
fn test_count(n: usize, test_fraction: f64) -> Result<usize> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(TrainerError::InvalidConfig(format!(
            "test fraction {} outside (0, 1)",
            test_fraction
        )));
    }
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(TrainerError::InsufficientData {
            task: "train/test split",
            rows: n,
            required: 2,
        });
    }
    Ok(n_test)
}

/// Shuffled split of `n` rows.
pub fn random_split(n: usize, test_fraction: f64, rng: &mut impl Rng) -> Result<Split> {
    let n_test = test_count(n, test_fraction)?;
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    let train = indices.split_off(n_test);
    Ok(Split {
        train,
        test: indices,
    })
}

/// Split preserving the class proportions of `labels` in both halves.
///
/// Fails when a class has fewer than two rows or either half cannot hold one
/// row per class.
pub fn stratified_split<L: Ord + Copy>(
    labels: &[L],
    test_fraction: f64,
    rng: &mut impl Rng,
) -> Result<Split> {
    let n = labels.len();
    let n_test = test_count(n, test_fraction)?;

    let mut classes: BTreeMap<L, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        classes.entry(*label).or_default().push(i);
    }

    if let Some(rows) = classes.values().map(Vec::len).find(|&c| c < 2) {
        return Err(TrainerError::Split(format!(
            "least populated class has {} row(s), need 2",
            rows
        )));
    }
    let n_classes = classes.len();
    if n_test < n_classes || n - n_test < n_classes {
        return Err(TrainerError::Split(format!(
            "{} test / {} train rows cannot cover {} classes",
            n_test,
            n - n_test,
            n_classes
        )));
    }

    // Proportional allocation, remainders to the largest fractional parts
    let mut allocation: Vec<(usize, f64)> = classes
        .values()
        .map(|rows| {
            let exact = rows.len() as f64 * n_test as f64 / n as f64;
            (exact.floor() as usize, exact - exact.floor())
        })
        .collect();
    let mut remaining = n_test - allocation.iter().map(|(c, _)| c).sum::<usize>();
    let mut order: Vec<usize> = (0..allocation.len()).collect();
    order.sort_by(|&a, &b| allocation[b].1.total_cmp(&allocation[a].1).then(a.cmp(&b)));
    for idx in order {
        if remaining == 0 {
            break;
        }
        allocation[idx].0 += 1;
        remaining -= 1;
    }

    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);
    for (mut rows, (take, _)) in classes.into_values().zip(allocation) {
        rows.shuffle(rng);
        let rest = rows.split_off(take.min(rows.len()));
        test.extend(rows);
        train.extend(rest);
    }
    train.shuffle(rng);
    test.shuffle(rng);

    Ok(Split { train, test })
}

/// Stratified split, degrading to a shuffled split when stratification is
/// impossible.
pub fn split_with_fallback<L: Ord + Copy>(
    labels: &[L],
    test_fraction: f64,
    rng: &mut impl Rng,
) -> Result<(Split, bool)> {
    match stratified_split(labels, test_fraction, rng) {
        Ok(split) => Ok((split, true)),
        Err(TrainerError::Split(reason)) => {
            warn!("Stratified split failed ({}); using random split", reason);
            Ok((random_split(labels.len(), test_fraction, rng)?, false))
        }
        Err(e) => Err(e),
    }
}

/// Linear-interpolated percentile of sorted values (`q` in [0, 100]).
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Assign each value to one of `n_bins` quantile bins.
///
/// Duplicate edges are merged, so heavily tied data yields fewer bins.
pub fn quantile_bins(values: &[f64], n_bins: usize) -> Vec<usize> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut inner: Vec<f64> = (1..n_bins.max(1))
        .map(|k| percentile(&sorted, 100.0 * k as f64 / n_bins as f64))
        .collect();
    inner.dedup();
    if let (Some(lo), Some(hi)) = (sorted.first(), sorted.last()) {
        inner.retain(|e| e > lo && e < hi);
    }

    values
        .iter()
        .map(|v| inner.iter().filter(|e| v >= e).count())
        .collect()
}
