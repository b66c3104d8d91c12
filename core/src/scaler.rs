//! Standardizing feature scaler (zero mean, unit variance per column).
//!
//! Fit once on the training matrix; the fitted parameters travel inside
//! the model snapshot so prediction-time scaling always matches the
//! training distribution.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        assert!(!rows.is_empty(), "cannot fit scaler on empty data");
        let dim = rows[0].len();
        let n = rows.len() as f64;

        let mut means = vec![0.0; dim];
        for row in rows {
            for (m, x) in means.iter_mut().zip(row) {
                *m += x;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut stds = vec![0.0; dim];
        for row in rows {
            for ((s, m), x) in stds.iter_mut().zip(&means).zip(row) {
                let d = x - m;
                *s += d * d;
            }
        }
        for s in &mut stds {
            *s = (*s / n).sqrt();
            // Constant columns scale to zero offset, not NaN.
            if *s < 1e-12 {
                *s = 1.0;
            }
        }

        Self { means, stds }
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.means)
            .zip(&self.stds)
            .map(|((x, m), s)| (x - m) / s)
            .collect()
    }

    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }

    pub fn dim(&self) -> usize {
        self.means.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardizes_columns() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0], vec![5.0, 10.0]];
        let scaler = StandardScaler::fit(&rows);
        let t = scaler.transform(&[3.0, 10.0]);
        assert!(t[0].abs() < 1e-9);
        // Constant column maps to zero without dividing by zero.
        assert!(t[1].abs() < 1e-9);
    }
}
