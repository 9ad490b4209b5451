//! Severity classifier
//!
//! Turns a cluster labelling into severity-tagged points:
//! - high: noise points (label `-1`)
//! - medium: members of a minority cluster, i.e. a non-noise cluster whose
//!   population is at most `minority_threshold + noise count`
//!
//! Everything else is normal. High and medium never overlap.

use crate::clustering::{ClusterLabeling, ClusterStatistics, NOISE};
use crate::models::Severity;

/// Labels of the minority clusters, ascending
pub fn minority_clusters(stats: &ClusterStatistics, threshold: usize) -> Vec<i64> {
    // Without noise this is just the raw threshold
    let adjusted = threshold + stats.noise_count();
    let mut labels: Vec<i64> = stats
        .iter()
        .filter(|&(label, count)| label != NOISE && count <= adjusted)
        .map(|(label, _)| label)
        .collect();
    labels.sort_unstable();
    labels
}

/// Result of classifying one labelling
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub minority: Vec<i64>,
    /// Dataset indices with their severity: high bucket first, then
    /// medium, ascending index within each bucket
    pub flagged: Vec<(usize, Severity)>,
}

impl Classification {
    pub fn high(&self) -> impl Iterator<Item = usize> + '_ {
        self.with(Severity::High)
    }

    pub fn medium(&self) -> impl Iterator<Item = usize> + '_ {
        self.with(Severity::Medium)
    }

    fn with(&self, severity: Severity) -> impl Iterator<Item = usize> + '_ {
        self.flagged
            .iter()
            .filter(move |(_, s)| *s == severity)
            .map(|(i, _)| *i)
    }
}

pub fn classify(labeling: &ClusterLabeling, stats: &ClusterStatistics, threshold: usize) -> Classification {
    let minority = minority_clusters(stats, threshold);

    let labels = labeling.labels();
    let high = labels
        .iter()
        .enumerate()
        .filter(|(_, l)| **l == NOISE)
        .map(|(i, _)| (i, Severity::High));
    let medium = labels
        .iter()
        .enumerate()
        .filter(|(_, l)| minority.binary_search(*l).is_ok())
        .map(|(i, _)| (i, Severity::Medium));
    let flagged = high.chain(medium).collect();

    Classification { minority, flagged }
}
