// MechInsight Trainer - Predictive-maintenance models
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Isolation forest anomaly detector.
//!
//! Each tree isolates a random subsample by splitting on a random feature at
//! a random threshold. Anomalies isolate in fewer splits, so a short mean path
//! length means a high anomaly score.
//!
//! `decision_function` is shifted so that the contamination quantile of the
//! training scores sits at zero: positive values are inliers, negative values
//! outliers.

use crate::error::{Result, TrainerError};
use crate::split::percentile;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Offset used when no contamination is given.
const DEFAULT_OFFSET: f64 = -0.5;

/// Isolation forest parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IsolationForestConfig {
    /// Number of trees.
    pub n_trees: usize,
    /// Subsample size per tree (capped at the row count).
    pub max_samples: usize,
    /// Expected outlier fraction; `None` uses a fixed offset.
    pub contamination: Option<f64>,
}

impl Default for IsolationForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_samples: 256,
            contamination: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

/// One isolation tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationTree {
    root: Node,
}

impl IsolationTree {
    fn build(rows: &[&[f64]], height_limit: usize, rng: &mut impl Rng) -> Self {
        Self {
            root: grow(rows, 0, height_limit, rng),
        }
    }

    /// Path length of `row`, with the expected remainder added at the leaf.
    pub fn path_length(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        let mut depth = 0.0;
        loop {
            match node {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] < *threshold { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }
}

fn grow(rows: &[&[f64]], depth: usize, height_limit: usize, rng: &mut impl Rng) -> Node {
    if depth >= height_limit || rows.len() <= 1 {
        return Node::Leaf { size: rows.len() };
    }

    // Only features that still vary can split
    let width = rows[0].len();
    let candidates: Vec<(usize, f64, f64)> = (0..width)
        .filter_map(|f| {
            let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
                (lo.min(r[f]), hi.max(r[f]))
            });
            (hi > lo).then_some((f, lo, hi))
        })
        .collect();

    let Some(&(feature, lo, hi)) = candidates.choose(rng) else {
        return Node::Leaf { size: rows.len() };
    };
    let threshold = rng.gen_range(lo..hi);

    let (left, right): (Vec<&[f64]>, Vec<&[f64]>) =
        rows.iter().copied().partition(|r| r[feature] < threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(grow(&left, depth + 1, height_limit, rng)),
        right: Box::new(grow(&right, depth + 1, height_limit, rng)),
    }
}

/// Average path length of an unsuccessful search in a binary search tree of
/// `n` nodes.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Trained isolation forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
    n_features: usize,
    /// Shift applied by [`IsolationForest::decision_function`].
    pub offset: f64,
}

impl IsolationForest {
    /// Fit on `rows` (all rows must share one width).
    pub fn fit(
        rows: &[Vec<f64>],
        config: &IsolationForestConfig,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        if rows.len() < 2 {
            return Err(TrainerError::InsufficientData {
                task: "isolation forest",
                rows: rows.len(),
                required: 2,
            });
        }
        if config.n_trees == 0 || config.max_samples < 2 {
            return Err(TrainerError::InvalidConfig(
                "isolation forest needs at least one tree and two samples per tree".to_string(),
            ));
        }
        let n_features = rows[0].len();
        if let Some(bad) = rows.iter().find(|r| r.len() != n_features) {
            return Err(TrainerError::DimensionMismatch {
                expected: n_features,
                actual: bad.len(),
            });
        }

        let sample_size = config.max_samples.min(rows.len());
        let height_limit = (sample_size as f64).log2().ceil() as usize;
        info!(
            trees = config.n_trees,
            sample_size,
            "Fitting isolation forest on {} rows",
            rows.len()
        );

        let trees = (0..config.n_trees)
            .map(|_| {
                let subsample: Vec<&[f64]> = rand::seq::index::sample(rng, rows.len(), sample_size)
                    .into_iter()
                    .map(|i| rows[i].as_slice())
                    .collect();
                IsolationTree::build(&subsample, height_limit, rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            sample_size,
            n_features,
            offset: DEFAULT_OFFSET,
        };

        if let Some(contamination) = config.contamination {
            if !(contamination > 0.0 && contamination <= 0.5) {
                return Err(TrainerError::InvalidConfig(format!(
                    "contamination {} outside (0, 0.5]",
                    contamination
                )));
            }
            let mut scores = forest.score_samples(rows)?;
            scores.sort_by(f64::total_cmp);
            forest.offset = percentile(&scores, 100.0 * contamination);
        }
        debug!(offset = forest.offset, "Isolation forest threshold set");

        Ok(forest)
    }

    /// Negated anomaly score of one row, in [-1, 0]; lower is more anomalous.
    pub fn score_row(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(TrainerError::DimensionMismatch {
                expected: self.n_features,
                actual: row.len(),
            });
        }
        let mean_path = self.trees.iter().map(|t| t.path_length(row)).sum::<f64>()
            / self.trees.len() as f64;
        let norm = average_path_length(self.sample_size).max(f64::EPSILON);
        Ok(-(2f64.powf(-mean_path / norm)))
    }

    /// Negated anomaly scores of every row.
    pub fn score_samples(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|r| self.score_row(r)).collect()
    }

    /// Shifted scores: positive = inlier, negative = outlier.
    pub fn decision_function(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        Ok(self
            .score_samples(rows)?
            .into_iter()
            .map(|s| s - self.offset)
            .collect())
    }

    /// Outlier flags.
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<bool>> {
        Ok(self
            .decision_function(rows)?
            .into_iter()
            .map(|d| d < 0.0)
            .collect())
    }

    /// Number of trees.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
