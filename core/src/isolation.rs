//! Isolation forest for unsupervised outlier detection.
//!
//! Standard construction: each tree isolates points by splitting on a
//! random feature at a random threshold within the subsample's range.
//! Outliers isolate in fewer splits, so a short average path length means
//! a high anomaly score. Scores are normalized by the expected path
//! length c(n) of an unsuccessful BST search, giving scores in (0, 1].
//!
//! The decision threshold is set from the training data at fit time:
//! the (1 - contamination) quantile of training scores, mirroring the
//! contamination parameter of the off-the-shelf implementation this
//! replaces.

use crate::rng::ModelRng;
use serde::{Deserialize, Serialize};

const EULER_MASCHERONI: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone, Serialize, Deserialize)]
enum IsoNode {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<IsoNode>,
        right: Box<IsoNode>,
    },
    Leaf {
        size: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsoNode>,
    sample_size: usize,
    /// Training-score quantile separating inliers from outliers.
    threshold: f64,
}

/// Expected path length of an unsuccessful search in a BST of n nodes.
fn c_factor(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    2.0 * ((n - 1.0).ln() + EULER_MASCHERONI) - 2.0 * (n - 1.0) / n
}

fn build_tree(rows: &[&[f64]], depth: usize, max_depth: usize, rng: &mut ModelRng) -> IsoNode {
    if rows.len() <= 1 || depth >= max_depth {
        return IsoNode::Leaf { size: rows.len() };
    }

    let dim = rows[0].len();
    let feature = rng.next_below(dim);

    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for row in rows {
        lo = lo.min(row[feature]);
        hi = hi.max(row[feature]);
    }
    if hi - lo < 1e-12 {
        // All values identical on the chosen feature: cannot split further.
        return IsoNode::Leaf { size: rows.len() };
    }

    let threshold = rng.uniform(lo, hi);
    let (left, right): (Vec<&[f64]>, Vec<&[f64]>) =
        rows.iter().partition(|row| row[feature] < threshold);
    if left.is_empty() || right.is_empty() {
        return IsoNode::Leaf { size: rows.len() };
    }

    IsoNode::Split {
        feature,
        threshold,
        left: Box::new(build_tree(&left, depth + 1, max_depth, rng)),
        right: Box::new(build_tree(&right, depth + 1, max_depth, rng)),
    }
}

fn path_length(node: &IsoNode, row: &[f64], depth: usize) -> f64 {
    match node {
        IsoNode::Leaf { size } => depth as f64 + c_factor(*size),
        IsoNode::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if row[*feature] < *threshold {
                path_length(left, row, depth + 1)
            } else {
                path_length(right, row, depth + 1)
            }
        }
    }
}

impl IsolationForest {
    /// Fit on (mostly normal) training rows. `contamination` is the
    /// expected outlier share used to place the decision threshold.
    pub fn fit(
        rows: &[Vec<f64>],
        n_estimators: usize,
        contamination: f64,
        rng: &mut ModelRng,
    ) -> Self {
        assert!(!rows.is_empty(), "cannot fit isolation forest on empty data");
        let sample_size = rows.len().min(256);
        let max_depth = (sample_size as f64).log2().ceil() as usize;

        let mut trees = Vec::with_capacity(n_estimators);
        for _ in 0..n_estimators {
            let sample: Vec<&[f64]> = (0..sample_size)
                .map(|_| rows[rng.next_below(rows.len())].as_slice())
                .collect();
            trees.push(build_tree(&sample, 0, max_depth.max(1), rng));
        }

        let mut forest = Self {
            trees,
            sample_size,
            threshold: 0.5,
        };

        let mut train_scores: Vec<f64> =
            rows.iter().map(|r| forest.anomaly_score(r)).collect();
        train_scores.sort_by(|a, b| a.partial_cmp(b).expect("scores are finite"));
        let quantile = (1.0 - contamination).clamp(0.0, 1.0);
        let idx = ((train_scores.len() as f64 * quantile).floor() as usize)
            .min(train_scores.len() - 1);
        forest.threshold = train_scores[idx];
        forest
    }

    /// Anomaly score in (0, 1]; higher is more anomalous.
    pub fn anomaly_score(&self, row: &[f64]) -> f64 {
        let avg_path: f64 = self
            .trees
            .iter()
            .map(|t| path_length(t, row, 0))
            .sum::<f64>()
            / self.trees.len() as f64;
        let c = c_factor(self.sample_size).max(1e-12);
        2.0_f64.powf(-avg_path / c)
    }

    /// Signed decision function: positive for inliers, negative for
    /// outliers, magnitude is the distance from the fitted threshold.
    pub fn decision_function(&self, row: &[f64]) -> f64 {
        self.threshold - self.anomaly_score(row)
    }

    /// Binary outlier decision at the fitted threshold.
    pub fn is_outlier(&self, row: &[f64]) -> bool {
        self.anomaly_score(row) > self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ComponentSlot;

    #[test]
    fn isolates_obvious_outlier() {
        let mut rng = ModelRng::for_component(7, ComponentSlot::OutlierForest);
        let mut rows: Vec<Vec<f64>> = Vec::new();
        for i in 0..200 {
            let x = (i % 20) as f64 * 0.1;
            rows.push(vec![x, 1.0 - x]);
        }
        let forest = IsolationForest::fit(&rows, 50, 0.1, &mut rng);

        let inlier = forest.anomaly_score(&[0.5, 0.5]);
        let outlier = forest.anomaly_score(&[50.0, -50.0]);
        assert!(
            outlier > inlier,
            "outlier {outlier} should score above inlier {inlier}"
        );
        assert!(forest.is_outlier(&[50.0, -50.0]));
    }
}
