//! Density clustering of the embedding
//!
//! - [`dbscan`]: density-reachability clustering
//! - [`epsilon`]: neighbourhood radius selection (knee + silhouette sweep)
//! - [`engine`]: the run / retry / degenerate state machine
//! - [`silhouette`]: clustering quality score

pub mod dbscan;
pub mod engine;
pub mod epsilon;
pub mod silhouette;

pub use dbscan::Dbscan;
pub use engine::{ClusterEngine, EngineOutcome};
pub use epsilon::{find_knee, knee_epsilon, nearest_neighbor_distances, sweep_silhouette, SweepResult};
pub use silhouette::silhouette_score;

use rustc_hash::FxHashMap;

use crate::models::ClusterCount;

/// Reserved label for points not density-reachable from any core point
pub const NOISE: i64 = -1;

/// One label per embedded point, aligned by index
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClusterLabeling {
    labels: Vec<i64>,
}

impl ClusterLabeling {
    pub fn new(labels: Vec<i64>) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    pub fn label(&self, index: usize) -> Option<i64> {
        self.labels.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of distinct labels, noise included
    pub fn distinct_labels(&self) -> usize {
        let mut seen: Vec<i64> = self.labels.clone();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }

    pub fn statistics(&self) -> ClusterStatistics {
        ClusterStatistics::from_labels(&self.labels)
    }
}

/// Label populations, ascending by count (ties by label)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClusterStatistics {
    counts: Vec<(i64, usize)>,
}

impl ClusterStatistics {
    pub fn from_labels(labels: &[i64]) -> Self {
        let mut map: FxHashMap<i64, usize> = FxHashMap::default();
        for &label in labels {
            *map.entry(label).or_insert(0) += 1;
        }
        Self::from_counts(map)
    }

    pub fn from_counts(counts: impl IntoIterator<Item = (i64, usize)>) -> Self {
        let mut counts: Vec<(i64, usize)> = counts.into_iter().collect();
        counts.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        Self { counts }
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, usize)> + '_ {
        self.counts.iter().copied()
    }

    pub fn count(&self, label: i64) -> usize {
        self.counts
            .iter()
            .find(|(l, _)| *l == label)
            .map_or(0, |(_, c)| *c)
    }

    pub fn noise_count(&self) -> usize {
        self.count(NOISE)
    }

    pub fn has_noise(&self) -> bool {
        self.counts.iter().any(|(l, _)| *l == NOISE)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn to_counts(&self) -> Vec<ClusterCount> {
        self.iter()
            .map(|(label, count)| ClusterCount { label, count })
            .collect()
    }
}
