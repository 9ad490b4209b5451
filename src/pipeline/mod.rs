//! Detection pipeline
//!
//! Orchestrates one scan, stage by stage:
//! 1. Parse the input into records
//! 2. Encode records into the dataset
//! 3. Project the dataset to 2-D
//! 4. Select epsilon (fixed, or knee + optional silhouette sweep)
//! 5. Cluster, with the default-radius retry
//! 6. Classify severities and build findings
//!
//! Every stage consumes the complete output of the previous one.

use std::path::Path;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::classifier::{classify, Classification};
use crate::clustering::{
    knee_epsilon, silhouette_score, sweep_silhouette, ClusterEngine, ClusterLabeling,
    ClusterStatistics, EngineOutcome,
};
use crate::config::RunConfig;
use crate::embedding::Embedding;
use crate::encoding::Dataset;
use crate::enrich::{NullInspector, ProcFsInspector, ProcessInspector};
use crate::error::Result;
use crate::models::{
    EmbeddingPoint, EpsilonSummary, Finding, FindingsSummary, Record, ScanReport, ScanStatus,
};
use crate::parsers::{self, LogType, ParsedInput};

/// Full detection pipeline.
pub struct Pipeline {
    config: RunConfig,
    inspector: Box<dyn ProcessInspector>,
}

impl Pipeline {
    /// Create a pipeline. Process findings are enriched from `/proc`
    /// unless enrichment is disabled in the configuration.
    pub fn new(config: RunConfig) -> Self {
        let inspector: Box<dyn ProcessInspector> = if config.enrich {
            Box::new(ProcFsInspector::default())
        } else {
            Box::new(NullInspector)
        };
        Self { config, inspector }
    }

    /// Replace the process inspector.
    pub fn with_inspector(mut self, inspector: impl ProcessInspector + 'static) -> Self {
        self.inspector = Box::new(inspector);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Scan a file.
    pub fn scan_file(&self, path: &Path, log_type: LogType) -> Result<ScanOutput> {
        let parsed = parsers::parse_file(path, log_type, &self.config)?;
        self.scan_parsed(parsed, log_type, &path.display().to_string())
    }

    /// Scan already loaded text; `source` only labels the report.
    pub fn scan_str(&self, text: &str, log_type: LogType, source: &str) -> Result<ScanOutput> {
        let parsed = parsers::parse_str(text, log_type, &self.config)?;
        self.scan_parsed(parsed, log_type, source)
    }

    pub fn scan_parsed(&self, parsed: ParsedInput, log_type: LogType, source: &str) -> Result<ScanOutput> {
        let records_read = parsed.len();
        let dataset = match parsed {
            ParsedInput::Http(records) => Dataset::from_http(records, &self.config)?,
            ParsedInput::Processes { records, skipped } => {
                if skipped > 0 {
                    info!("Skipped {} malformed or duplicate process rows", skipped);
                }
                Dataset::from_processes(records, &self.config)?
            }
        };
        info!(
            "Dataset: {} records x {} features ({} dropped, {} over the cap)",
            dataset.len(),
            dataset.dimension(),
            dataset.dropped(),
            dataset.truncated()
        );

        let embedding = Embedding::project(&dataset, self.config.standardize)?;
        let detection = self.detect(embedding.points())?;
        let findings = self.findings(&dataset, &detection);
        let findings_summary = FindingsSummary::from_findings(&findings);
        info!(
            "Findings: {} high, {} medium",
            findings_summary.high, findings_summary.medium
        );

        let report = ScanReport {
            run_id: Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            source: source.to_string(),
            log_type: log_type.name().to_string(),
            encoding: self.config.encoding.to_string(),
            status: detection.status(),
            records_read,
            records_dropped: dataset.dropped() + dataset.truncated(),
            dataset_size: dataset.len(),
            features: dataset.feature_names().to_vec(),
            explained_variance_ratio: embedding.explained_variance_ratio().to_vec(),
            epsilon: detection.epsilon_summary(),
            silhouette: detection.silhouette,
            clusters: detection.statistics.to_counts(),
            minority_clusters: detection
                .classification
                .as_ref()
                .map(|c| c.minority.clone())
                .unwrap_or_default(),
            findings,
            findings_summary,
        };

        Ok(ScanOutput {
            report,
            dataset,
            embedding,
            labeling: detection.outcome.labeling().clone(),
        })
    }

    /// Epsilon selection, clustering and classification over embedded points.
    pub fn detect(&self, points: &[[f64; 2]]) -> Result<Detection> {
        let knee = match self.config.eps {
            Some(eps) => {
                info!("Using fixed epsilon {}", eps);
                None
            }
            None => {
                let knee = knee_epsilon(points, self.config.knee_sensitivity)?;
                info!("Knee epsilon: {:.6}", knee);
                Some(knee)
            }
        };
        let mut selected = self.config.eps.or(knee).unwrap_or(self.config.default_radius);

        if self.config.optimize_silhouette {
            let sweep = sweep_silhouette(
                points,
                selected,
                self.config.lambda_step,
                self.config.sweep_ceiling,
                self.config.min_samples,
            );
            info!(
                "Silhouette sweep: {} candidates scored, epsilon {:.6} -> {:.6}",
                sweep.evaluated, selected, sweep.eps
            );
            selected = sweep.eps;
        }

        let outcome = ClusterEngine::from_config(&self.config).run(points, selected);
        let statistics = outcome.labeling().statistics();
        debug!("Cluster statistics: {:?}", statistics);

        if outcome.is_degenerate() {
            return Ok(Detection {
                knee,
                selected,
                outcome,
                statistics,
                classification: None,
                silhouette: None,
            });
        }

        let silhouette = silhouette_score(points, outcome.labeling());
        let classification = classify(outcome.labeling(), &statistics, self.config.minority_threshold);
        info!(
            "{} clusters, {} noise points, minority clusters {:?}",
            statistics.len(),
            statistics.noise_count(),
            classification.minority
        );

        Ok(Detection {
            knee,
            selected,
            outcome,
            statistics,
            classification: Some(classification),
            silhouette,
        })
    }

    /// Findings in classifier order, enriched where they come from a process
    fn findings(&self, dataset: &Dataset, detection: &Detection) -> Vec<Finding> {
        let Some(classification) = &detection.classification else {
            return Vec::new();
        };
        let labeling = detection.outcome.labeling();

        classification
            .flagged
            .iter()
            .filter_map(|&(index, severity)| {
                let entry = dataset.get(index)?;
                let process_details = match &entry.record {
                    Record::Process(p) if self.config.enrich => self
                        .inspector
                        .details(p.pid, &self.config.enrichment_attributes),
                    _ => Default::default(),
                };
                Some(Finding {
                    index,
                    key: entry.record.key(),
                    severity,
                    cluster: labeling.label(index).unwrap_or_default(),
                    payload: entry.record.payload(dataset.feature_names()),
                    process_details,
                })
            })
            .collect()
    }
}

/// Epsilon, clustering and classification of one run
#[derive(Debug, Clone)]
pub struct Detection {
    pub knee: Option<f64>,
    pub selected: f64,
    pub outcome: EngineOutcome,
    pub statistics: ClusterStatistics,
    /// Absent when clustering was degenerate
    pub classification: Option<Classification>,
    pub silhouette: Option<f64>,
}

impl Detection {
    pub fn status(&self) -> ScanStatus {
        if self.outcome.is_degenerate() {
            ScanStatus::Degenerate
        } else {
            ScanStatus::Clustered
        }
    }

    fn epsilon_summary(&self) -> EpsilonSummary {
        EpsilonSummary {
            knee: self.knee,
            selected: Some(self.selected),
            used: Some(self.outcome.eps_used()),
            retried: self.outcome.retried(),
        }
    }
}

/// Everything a scan produced: the report plus the index-aligned data
/// behind it
#[derive(Debug, Clone)]
pub struct ScanOutput {
    pub report: ScanReport,
    pub dataset: Dataset,
    pub embedding: Embedding,
    pub labeling: ClusterLabeling,
}

impl ScanOutput {
    /// Embedding with labels, for plotting tools
    pub fn embedding_points(&self) -> Vec<EmbeddingPoint> {
        self.dataset
            .entries()
            .iter()
            .zip(self.embedding.points())
            .zip(self.labeling.labels())
            .map(|((entry, point), &label)| EmbeddingPoint {
                index: entry.index,
                key: entry.record.key(),
                pc_1: point[0],
                pc_2: point[1],
                label,
            })
            .collect()
    }

    /// Get a summary string.
    pub fn summary(&self) -> String {
        let r = &self.report;
        format!(
            "{} records, {} clusters, {} high, {} medium",
            r.dataset_size,
            r.clusters.iter().filter(|c| c.label != -1).count(),
            r.findings_summary.high,
            r.findings_summary.medium
        )
    }
}
