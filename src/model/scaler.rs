//! Standardization (zero mean, unit variance)

use serde::{Deserialize, Serialize};

/// Per-column standard scaler fitted on the training split only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit column means and population standard deviations.
    ///
    /// Constant columns get scale 1 so they map to 0 instead of NaN.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let dim = rows.first().map_or(0, Vec::len);
        let n = rows.len().max(1) as f64;

        let mut mean = vec![0.0; dim];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut var = vec![0.0; dim];
        for row in rows {
            for ((acc, v), m) in var.iter_mut().zip(row).zip(&mean) {
                *acc += (v - m).powi(2);
            }
        }
        let scale = var
            .into_iter()
            .map(|v| {
                let std = (v / n).sqrt();
                if std > f64::EPSILON {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Self { mean, scale }
    }

    /// Identity scaler of the given width
    #[must_use]
    pub fn identity(dim: usize) -> Self {
        Self {
            mean: vec![0.0; dim],
            scale: vec![1.0; dim],
        }
    }

    /// Number of columns
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.mean.len()
    }

    /// Column means
    #[must_use]
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Column scales
    #[must_use]
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Standardize one row. Extra columns pass through unchanged.
    #[must_use]
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(i, v)| match (self.mean.get(i), self.scale.get(i)) {
                (Some(m), Some(s)) => (v - m) / s,
                _ => *v,
            })
            .collect()
    }

    /// Standardize many rows
    #[must_use]
    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_transform_standardizes() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = StandardScaler::fit(&rows);

        assert_eq!(scaler.mean(), &[2.0, 10.0]);
        assert_eq!(scaler.scale(), &[1.0, 1.0]);
        assert_eq!(scaler.transform(&[1.0, 10.0]), vec![-1.0, 0.0]);
        assert_eq!(scaler.transform(&[3.0, 12.0]), vec![1.0, 2.0]);
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let rows = vec![vec![5.0], vec![5.0], vec![5.0]];
        let scaler = StandardScaler::fit(&rows);
        assert_eq!(scaler.transform(&[5.0]), vec![0.0]);
    }

    #[test]
    fn test_identity() {
        let scaler = StandardScaler::identity(3);
        assert_eq!(scaler.dimension(), 3);
        assert_eq!(scaler.transform(&[1.0, 2.0, 3.0]), vec![1.0, 2.0, 3.0]);
    }
}
