//! Neighbourhood radius selection
//!
//! The candidate epsilon is the knee of the sorted nearest-neighbour
//! distance curve (Kneedle method). It can then be refined by a bounded
//! silhouette sweep.

use rayon::prelude::*;
use tracing::debug;

use super::{silhouette_score, Dbscan};
use crate::embedding::distance;
use crate::error::{Result, WebhawkError};

/// Distance from each point to its nearest other point, in index order
pub fn nearest_neighbor_distances(points: &[[f64; 2]]) -> Vec<f64> {
    (0..points.len())
        .into_par_iter()
        .map(|i| {
            points
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, q)| distance(&points[i], q))
                .fold(f64::INFINITY, f64::min)
        })
        .collect()
}

/// Knee of the nearest-neighbour curve of `points`
///
/// A knee inside the zero-distance plateau of repeated points is no usable
/// radius and is reported as no knee at all.
pub fn knee_epsilon(points: &[[f64; 2]], sensitivity: f64) -> Result<f64> {
    let mut distances = nearest_neighbor_distances(points);
    distances.sort_by(|a, b| a.total_cmp(b));
    let knee = find_knee(&distances, sensitivity)?;
    if knee > 0.0 {
        Ok(knee)
    } else {
        debug!("Knee lies on the zero-distance plateau ({} points)", points.len());
        Err(WebhawkError::KneeNotFound {
            points: distances.len(),
        })
    }
}

/// Kneedle on an ascending, convex curve; returns the y value at the knee.
///
/// x is the rank, y the value. Both are min-max normalised, y is flipped
/// into a concave shape and the difference curve `y - x` is searched for
/// its first local maximum that is followed by a drop below
/// `max - sensitivity * mean(dx)`.
pub fn find_knee(sorted: &[f64], sensitivity: f64) -> Result<f64> {
    let n = sorted.len();
    let not_found = || WebhawkError::KneeNotFound { points: n };
    if n < 2 {
        return Err(not_found());
    }

    let y_min = sorted.iter().copied().fold(f64::INFINITY, f64::min);
    let y_max = sorted.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(y_max > y_min) || !y_max.is_finite() {
        return Err(not_found());
    }

    let x_norm: Vec<f64> = (0..n).map(|i| i as f64 / (n - 1) as f64).collect();
    let y_norm: Vec<f64> = sorted.iter().map(|y| (y - y_min) / (y_max - y_min)).collect();
    // convex increasing -> flip(max - y)
    let y_flipped: Vec<f64> = (0..n).map(|i| 1.0 - y_norm[n - 1 - i]).collect();
    let diff: Vec<f64> = (0..n).map(|i| y_flipped[i] - x_norm[i]).collect();

    let clip = |k: isize| k.clamp(0, n as isize - 1) as usize;
    let extrema = |keep: fn(f64, f64) -> bool| -> Vec<usize> {
        (0..n)
            .filter(|&i| {
                let i_s = i as isize;
                keep(diff[i], diff[clip(i_s + 1)]) && keep(diff[i], diff[clip(i_s - 1)])
            })
            .collect()
    };
    let maxima = extrema(|a, b| a >= b);
    let minima = extrema(|a, b| a <= b);
    let Some(&first_max) = maxima.first() else {
        return Err(not_found());
    };

    let mean_dx = x_norm.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f64>() / (n - 1) as f64;
    let thresholds: Vec<f64> = maxima
        .iter()
        .map(|&i| diff[i] - sensitivity * mean_dx)
        .collect();

    let mut threshold = 0.0;
    let mut threshold_index = first_max;
    let mut maxima_seen = 0;
    for i in first_max..n - 1 {
        if maxima.binary_search(&i).is_ok() {
            threshold = thresholds[maxima_seen];
            threshold_index = i;
            maxima_seen += 1;
        }
        if minima.binary_search(&i).is_ok() {
            threshold = 0.0;
        }
        if diff[i + 1] < threshold {
            // x was never flipped, only y: map back through the reversal
            return Ok(sorted[n - 1 - threshold_index]);
        }
    }

    Err(not_found())
}

/// Outcome of the silhouette sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepResult {
    /// Best-scoring epsilon, or the start value when nothing was scored
    pub eps: f64,
    pub score: Option<f64>,
    /// Candidates that produced more than one label
    pub evaluated: usize,
}

/// Hill search over `start + k * step` while the value stays within
/// `ceiling * start`. Ties keep the earlier epsilon.
pub fn sweep_silhouette(
    points: &[[f64; 2]],
    start: f64,
    step: f64,
    ceiling: f64,
    min_samples: usize,
) -> SweepResult {
    let limit = ceiling * start;
    let mut evaluated = 0;

    let best = (0u64..)
        .map(|k| start + k as f64 * step)
        .take_while(|&eps| eps <= limit)
        .fold(None::<(f64, f64)>, |best, eps| {
            let labeling = Dbscan::new(eps, min_samples).fit(points);
            if labeling.distinct_labels() < 2 {
                debug!("Sweep eps {:.4}: single label, skipped", eps);
                return best;
            }
            let Some(score) = silhouette_score(points, &labeling) else {
                return best;
            };
            evaluated += 1;
            debug!("Sweep eps {:.4}: silhouette {:.4}", eps, score);
            match best {
                Some((best_score, _)) if score <= best_score => best,
                _ => Some((score, eps)),
            }
        });

    match best {
        Some((score, eps)) => SweepResult {
            eps,
            score: Some(score),
            evaluated,
        },
        None => SweepResult {
            eps: start,
            score: None,
            evaluated,
        },
    }
}
