//! Silhouette coefficient
//!
//! Mean over all points of `(b - a) / max(a, b)`, where `a` is the mean
//! distance to the rest of the point's own cluster and `b` the smallest
//! mean distance to another cluster. Noise (`-1`) is scored as an ordinary
//! cluster. Points alone in their cluster score 0.

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use super::ClusterLabeling;
use crate::embedding::distance;

/// `None` unless there are between 2 and `n - 1` distinct labels.
pub fn silhouette_score(points: &[[f64; 2]], labeling: &ClusterLabeling) -> Option<f64> {
    let labels = labeling.labels();
    let n = points.len();
    if n != labels.len() {
        return None;
    }

    let mut sizes: FxHashMap<i64, usize> = FxHashMap::default();
    for &l in labels {
        *sizes.entry(l).or_insert(0) += 1;
    }
    if sizes.len() < 2 || sizes.len() >= n {
        return None;
    }

    // Collected first so the sum runs in index order
    let scores: Vec<f64> = (0..n)
        .into_par_iter()
        .map(|i| {
            let own = labels[i];
            if sizes[&own] == 1 {
                return 0.0;
            }

            let mut sums: FxHashMap<i64, f64> = FxHashMap::default();
            for j in 0..n {
                if j != i {
                    *sums.entry(labels[j]).or_insert(0.0) += distance(&points[i], &points[j]);
                }
            }

            let a = sums.get(&own).copied().unwrap_or(0.0) / (sizes[&own] - 1) as f64;
            let b = sums
                .iter()
                .filter(|(l, _)| **l != own)
                .map(|(l, s)| s / sizes[l] as f64)
                .fold(f64::INFINITY, f64::min);

            let denom = a.max(b);
            if denom > 0.0 {
                (b - a) / denom
            } else {
                0.0
            }
        })
        .collect();

    Some(scores.iter().sum::<f64>() / n as f64)
}
