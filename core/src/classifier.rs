//! Random-forest classifier used for fraud probability (two classes) and
//! credit banding (five classes).
//!
//! Gini-split decision trees over bootstrap samples, a random feature
//! subset (√d) per node, class probabilities averaged over tree leaves,
//! and gini-gain feature importances accumulated during fitting. Training
//! randomness flows through the caller's seeded stream, so a fitted
//! forest is a pure function of (data, params, seed).

use crate::rng::ModelRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub n_classes: usize,
}

impl ForestParams {
    pub fn new(n_estimators: usize, n_classes: usize) -> Self {
        Self {
            n_estimators,
            max_depth: 10,
            min_samples_split: 4,
            n_classes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        /// Class probabilities at this leaf.
        probs: Vec<f64>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<TreeNode>,
    params: ForestParams,
    /// Normalized gini-gain importance per feature column.
    importances: Vec<f64>,
}

fn class_counts(labels: &[usize], indices: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &i in indices {
        counts[labels[i]] += 1;
    }
    counts
}

fn gini(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

fn leaf_from(labels: &[usize], indices: &[usize], n_classes: usize) -> TreeNode {
    let counts = class_counts(labels, indices, n_classes);
    let total: usize = counts.iter().sum();
    let probs = if total == 0 {
        vec![1.0 / n_classes as f64; n_classes]
    } else {
        counts.iter().map(|&c| c as f64 / total as f64).collect()
    };
    TreeNode::Leaf { probs }
}

struct TreeBuilder<'a> {
    rows: &'a [Vec<f64>],
    labels: &'a [usize],
    params: ForestParams,
    max_features: usize,
    /// Unnormalized gini-gain accumulator, shared across the forest.
    importances: &'a mut [f64],
}

impl TreeBuilder<'_> {
    fn build(&mut self, indices: &[usize], depth: usize, rng: &mut ModelRng) -> TreeNode {
        let counts = class_counts(self.labels, indices, self.params.n_classes);
        let parent_gini = gini(&counts);
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

        if depth >= self.params.max_depth
            || indices.len() < self.params.min_samples_split
            || pure
        {
            return leaf_from(self.labels, indices, self.params.n_classes);
        }

        let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, gain)
        for _ in 0..self.max_features {
            let feature = rng.next_below(self.rows[0].len());
            // Candidate thresholds from a handful of in-node sample values.
            for _ in 0..8 {
                let pivot = indices[rng.next_below(indices.len())];
                let threshold = self.rows[pivot][feature];

                let mut left_counts = vec![0usize; self.params.n_classes];
                let mut right_counts = vec![0usize; self.params.n_classes];
                for &i in indices {
                    if self.rows[i][feature] < threshold {
                        left_counts[self.labels[i]] += 1;
                    } else {
                        right_counts[self.labels[i]] += 1;
                    }
                }
                let n_left: usize = left_counts.iter().sum();
                let n_right: usize = right_counts.iter().sum();
                if n_left == 0 || n_right == 0 {
                    continue;
                }

                let n = indices.len() as f64;
                let weighted = (n_left as f64 / n) * gini(&left_counts)
                    + (n_right as f64 / n) * gini(&right_counts);
                let gain = parent_gini - weighted;
                if gain > 1e-12 && best.map_or(true, |(_, _, g)| gain > g) {
                    best = Some((feature, threshold, gain));
                }
            }
        }

        let Some((feature, threshold, gain)) = best else {
            return leaf_from(self.labels, indices, self.params.n_classes);
        };

        self.importances[feature] += gain * indices.len() as f64;

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.rows[i][feature] < threshold);

        TreeNode::Split {
            feature,
            threshold,
            left: Box::new(self.build(&left_idx, depth + 1, rng)),
            right: Box::new(self.build(&right_idx, depth + 1, rng)),
        }
    }
}

fn leaf_probs<'a>(node: &'a TreeNode, row: &[f64]) -> &'a [f64] {
    match node {
        TreeNode::Leaf { probs } => probs,
        TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if row[*feature] < *threshold {
                leaf_probs(left, row)
            } else {
                leaf_probs(right, row)
            }
        }
    }
}

impl RandomForest {
    /// Fit on labeled rows. Labels must be in `0..params.n_classes`.
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[usize],
        params: ForestParams,
        rng: &mut ModelRng,
    ) -> Self {
        assert_eq!(rows.len(), labels.len());
        assert!(!rows.is_empty(), "cannot fit forest on empty data");

        let dim = rows[0].len();
        let max_features = ((dim as f64).sqrt().ceil() as usize).max(1);
        let mut importances = vec![0.0; dim];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            // Bootstrap sample with replacement, same size as the data.
            let sample: Vec<usize> =
                (0..rows.len()).map(|_| rng.next_below(rows.len())).collect();
            let mut builder = TreeBuilder {
                rows,
                labels,
                params,
                max_features,
                importances: &mut importances,
            };
            trees.push(builder.build(&sample, 0, rng));
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }

        Self {
            trees,
            params,
            importances,
        }
    }

    /// Average class probabilities over all trees.
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut acc = vec![0.0; self.params.n_classes];
        for tree in &self.trees {
            for (a, p) in acc.iter_mut().zip(leaf_probs(tree, row)) {
                *a += p;
            }
        }
        for a in &mut acc {
            *a /= self.trees.len() as f64;
        }
        acc
    }

    /// Most probable class index.
    pub fn predict(&self, row: &[f64]) -> usize {
        let probs = self.predict_proba(row);
        probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).expect("probabilities are finite"))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn n_classes(&self) -> usize {
        self.params.n_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ComponentSlot;

    #[test]
    fn separates_two_clusters() {
        let mut rng = ModelRng::for_component(11, ComponentSlot::FraudClassifier);
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..100 {
            let jitter = (i % 10) as f64 * 0.01;
            rows.push(vec![0.0 + jitter, 0.0 - jitter]);
            labels.push(0);
            rows.push(vec![10.0 + jitter, 10.0 - jitter]);
            labels.push(1);
        }
        let forest = RandomForest::fit(&rows, &labels, ForestParams::new(25, 2), &mut rng);

        assert_eq!(forest.predict(&[0.1, 0.1]), 0);
        assert_eq!(forest.predict(&[9.9, 9.9]), 1);
        let p = forest.predict_proba(&[10.0, 10.0]);
        assert!(p[1] > 0.8, "fraud-side probability too low: {}", p[1]);

        let total: f64 = forest.feature_importances().iter().sum();
        assert!((total - 1.0).abs() < 1e-9 || total == 0.0);
    }
}
