//! Embedding stage
//!
//! Reduces the dataset to a 2-D projection (`pc_1`, `pc_2`) used for
//! clustering and display. Same ordering and indexing as the dataset.

mod pca;
mod scaler;

pub use pca::{fit_transform, PcaResult, N_COMPONENTS};
pub use scaler::StandardScaler;

use tracing::info;

use crate::encoding::Dataset;
use crate::error::Result;

/// Index-aligned 2-D points
#[derive(Debug, Clone, Default)]
pub struct Embedding {
    points: Vec<[f64; 2]>,
    explained_variance_ratio: Vec<f64>,
}

impl Embedding {
    /// Wrap points that are already two-dimensional
    pub fn from_points(points: Vec<[f64; 2]>) -> Self {
        Self {
            points,
            explained_variance_ratio: Vec::new(),
        }
    }

    /// Project a dataset, optionally standardizing each feature first.
    pub fn project(dataset: &Dataset, standardize: bool) -> Result<Self> {
        let rows = dataset.rows();
        let matrix: Vec<Vec<f64>> = if standardize {
            StandardScaler::fit(&rows).transform(&rows)
        } else {
            rows.iter().map(|r| r.to_vec()).collect()
        };

        let result = fit_transform(&matrix)?;
        info!(
            "PCA: {} points, explained variance {:.3} / {:.3}",
            result.embedding.len(),
            result.explained_variance_ratio.first().copied().unwrap_or(0.0),
            result.explained_variance_ratio.get(1).copied().unwrap_or(0.0)
        );

        Ok(Self {
            points: result.embedding,
            explained_variance_ratio: result.explained_variance_ratio,
        })
    }

    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    pub fn explained_variance_ratio(&self) -> &[f64] {
        &self.explained_variance_ratio
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Euclidean distance between two embedded points
pub fn distance(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt()
}
