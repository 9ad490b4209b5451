//! DBSCAN (Density-Based Spatial Clustering of Applications with Noise)
//!
//! Points are classified as core, border, or noise:
//! - Core: at least `min_samples` points (itself included) within `eps`
//! - Border: within `eps` of a core point but not core itself
//! - Noise: neither core nor border (label = -1)
//!
//! Cluster ids are assigned in index order of the first core point that
//! starts each cluster. A border point reachable from two clusters joins
//! the one expanded first.

use rayon::prelude::*;

use super::{ClusterLabeling, NOISE};
use crate::embedding::distance;

#[derive(Debug, Clone, Copy)]
pub struct Dbscan {
    /// Maximum distance between neighbours
    pub eps: f64,
    /// Minimum neighbourhood size for a core point
    pub min_samples: usize,
}

impl Dbscan {
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self { eps, min_samples }
    }

    /// All points within `eps` of `idx`, itself included
    fn region_query(points: &[[f64; 2]], idx: usize, eps: f64) -> Vec<usize> {
        let p = &points[idx];
        (0..points.len())
            .filter(|&i| distance(p, &points[i]) <= eps)
            .collect()
    }

    pub fn fit(&self, points: &[[f64; 2]]) -> ClusterLabeling {
        let n = points.len();
        let eps = self.eps;

        // Neighbour lists, collected in index order
        let neighbors: Vec<Vec<usize>> = (0..n)
            .into_par_iter()
            .map(|i| Self::region_query(points, i, eps))
            .collect();

        let is_core: Vec<bool> = neighbors
            .iter()
            .map(|nb| nb.len() >= self.min_samples)
            .collect();

        let mut labels = vec![NOISE; n];
        let mut cluster_id: i64 = 0;

        for i in 0..n {
            if labels[i] != NOISE || !is_core[i] {
                continue;
            }

            labels[i] = cluster_id;
            let mut queue: Vec<usize> = vec![i];
            let mut head = 0;

            while head < queue.len() {
                let q = queue[head];
                head += 1;
                if !is_core[q] {
                    continue;
                }
                for &nb in &neighbors[q] {
                    if labels[nb] == NOISE {
                        labels[nb] = cluster_id;
                        queue.push(nb);
                    }
                }
            }

            cluster_id += 1;
        }

        ClusterLabeling::new(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_clusters_and_noise() {
        let points = [
            [1.0, 1.0], [1.1, 1.1], [1.2, 1.0], [1.0, 1.2],
            [8.0, 8.0], [8.1, 8.1], [8.2, 8.0], [8.0, 8.2],
            [50.0, 50.0],
        ];
        let labels = Dbscan::new(0.5, 3).fit(&points);
        assert_eq!(labels.labels(), &[0, 0, 0, 0, 1, 1, 1, 1, -1]);
    }

    #[test]
    fn test_min_samples_counts_the_point_itself() {
        // two points 0.4 apart: each has a neighbourhood of 2
        let points = [[0.0, 0.0], [0.4, 0.0], [9.0, 9.0]];
        assert_eq!(Dbscan::new(0.5, 2).fit(&points).labels(), &[0, 0, -1]);
        assert_eq!(Dbscan::new(0.5, 3).fit(&points).labels(), &[-1, -1, -1]);
    }

    #[test]
    fn test_chain_of_cores_is_one_cluster() {
        // interior points are core, the two ends are border points
        let points = [[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let labels = Dbscan::new(1.0, 3).fit(&points);
        assert_eq!(labels.labels(), &[0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_clusters_numbered_in_index_order() {
        // cores at 0.5 and 2.25; the gap 1.0 -> 1.75 is wider than eps
        let points = [[0.0, 0.0], [0.5, 0.0], [1.0, 0.0], [1.75, 0.0], [2.25, 0.0], [2.75, 0.0]];
        let labels = Dbscan::new(0.5, 3).fit(&points);
        assert_eq!(labels.labels(), &[0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_identical_points_form_one_cluster() {
        let points = vec![[3.0, 3.0]; 10];
        let labels = Dbscan::new(0.5, 2).fit(&points);
        assert_eq!(labels.distinct_labels(), 1);
        assert_eq!(labels.label(0), Some(0));
    }
}
