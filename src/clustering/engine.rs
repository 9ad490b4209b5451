//! Cluster engine
//!
//! Runs DBSCAN with the selected epsilon. A single-label result gets one
//! retry at the default radius; if that is still a single label the run
//! is degenerate and ends without findings.

use tracing::{info, warn};

use super::{ClusterLabeling, Dbscan};
use crate::config::RunConfig;

/// How clustering ended
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutcome {
    Clustered {
        labeling: ClusterLabeling,
        eps_used: f64,
        retried: bool,
    },
    /// One label before and after the retry
    Degenerate {
        labeling: ClusterLabeling,
        eps_used: f64,
    },
}

impl EngineOutcome {
    pub fn labeling(&self) -> &ClusterLabeling {
        match self {
            EngineOutcome::Clustered { labeling, .. } | EngineOutcome::Degenerate { labeling, .. } => {
                labeling
            }
        }
    }

    pub fn eps_used(&self) -> f64 {
        match self {
            EngineOutcome::Clustered { eps_used, .. } | EngineOutcome::Degenerate { eps_used, .. } => {
                *eps_used
            }
        }
    }

    pub fn retried(&self) -> bool {
        match self {
            EngineOutcome::Clustered { retried, .. } => *retried,
            EngineOutcome::Degenerate { .. } => true,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, EngineOutcome::Degenerate { .. })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ClusterEngine {
    pub min_samples: usize,
    /// Radius of the retry run
    pub default_radius: f64,
}

impl ClusterEngine {
    pub fn new(min_samples: usize, default_radius: f64) -> Self {
        Self {
            min_samples,
            default_radius,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.min_samples, config.default_radius)
    }

    pub fn run(&self, points: &[[f64; 2]], eps: f64) -> EngineOutcome {
        let labeling = Dbscan::new(eps, self.min_samples).fit(points);
        if labeling.distinct_labels() != 1 {
            return EngineOutcome::Clustered {
                labeling,
                eps_used: eps,
                retried: false,
            };
        }

        warn!(
            "DBSCAN with eps {:.4} produced a single label; retrying with the default radius {}",
            eps, self.default_radius
        );
        let labeling = Dbscan::new(self.default_radius, self.min_samples).fit(points);
        if labeling.distinct_labels() != 1 {
            return EngineOutcome::Clustered {
                labeling,
                eps_used: self.default_radius,
                retried: true,
            };
        }

        info!("Clustering is degenerate (single label after retry); no findings");
        EngineOutcome::Degenerate {
            labeling,
            eps_used: self.default_radius,
        }
    }
}
