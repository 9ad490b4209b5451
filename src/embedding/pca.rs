//! PCA (Principal Component Analysis)
//!
//! Exact projection onto the two leading eigenvectors of the sample
//! covariance matrix. Deterministic: no iteration, no random start.

use nalgebra::{DMatrix, SymmetricEigen};
use rayon::prelude::*;

use crate::error::{Result, WebhawkError};

/// Number of retained components
pub const N_COMPONENTS: usize = 2;

/// PCA result: the embedding plus explained variance per component
#[derive(Debug, Clone)]
pub struct PcaResult {
    pub embedding: Vec<[f64; 2]>,
    pub explained_variance_ratio: Vec<f64>,
    pub eigenvalues: Vec<f64>,
}

/// Project already centred-or-standardized rows onto two components.
///
/// Components are ranked by eigenvalue. Each eigenvector is sign-normalised
/// so its largest-magnitude loading is positive.
pub fn fit_transform(rows: &[Vec<f64>]) -> Result<PcaResult> {
    let n = rows.len();
    if n < 2 {
        return Err(WebhawkError::InsufficientData {
            what: "PCA samples",
            needed: 2,
            have: n,
        });
    }
    let d = rows[0].len();
    if d < N_COMPONENTS {
        return Err(WebhawkError::InsufficientData {
            what: "PCA features",
            needed: N_COMPONENTS,
            have: d,
        });
    }

    let means: Vec<f64> = (0..d)
        .map(|j| rows.iter().map(|r| r[j]).sum::<f64>() / n as f64)
        .collect();
    let centered = DMatrix::from_fn(n, d, |i, j| rows[i][j] - means[j]);
    let cov = (centered.transpose() * &centered) / (n as f64 - 1.0);

    let eigen = SymmetricEigen::new(cov.clone());
    let mut order: Vec<usize> = (0..d).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]).then(a.cmp(&b)));

    let components: Vec<Vec<f64>> = order
        .iter()
        .take(N_COMPONENTS)
        .map(|&k| {
            let v: Vec<f64> = eigen.eigenvectors.column(k).iter().copied().collect();
            normalise_sign(v)
        })
        .collect();

    // Negative eigenvalues are rounding noise on a PSD matrix
    let eigenvalues: Vec<f64> = order
        .iter()
        .take(N_COMPONENTS)
        .map(|&k| eigen.eigenvalues[k].max(0.0))
        .collect();
    let total_variance = cov.trace();
    let explained_variance_ratio = eigenvalues
        .iter()
        .map(|&ev| if total_variance > 0.0 { ev / total_variance } else { 0.0 })
        .collect();

    let embedding = (0..n)
        .into_par_iter()
        .map(|i| {
            let row = centered.row(i);
            let mut point = [0.0f64; 2];
            for (c, component) in components.iter().enumerate() {
                point[c] = row.iter().zip(component).map(|(x, w)| x * w).sum();
            }
            point
        })
        .collect();

    Ok(PcaResult {
        embedding,
        explained_variance_ratio,
        eigenvalues,
    })
}

fn normalise_sign(mut v: Vec<f64>) -> Vec<f64> {
    let pivot = v
        .iter()
        .copied()
        .fold(0.0f64, |best, x| if x.abs() > best.abs() { x } else { best });
    if pivot < 0.0 {
        v.iter_mut().for_each(|x| *x = -*x);
    }
    v
}
