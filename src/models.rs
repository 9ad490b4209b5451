//! Core data models for Webhawk
//!
//! These models are used throughout the codebase for representing
//! input records, findings, and scan results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::encoding::UrlMetrics;

/// Severity levels for findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Member of a minority cluster
    Medium,
    /// Noise point, not density-reachable from any core point
    High,
}

impl Severity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// One access-log line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpRecord {
    /// 0-based line position in the source file
    pub line: usize,
    pub raw: String,
    pub ip: String,
    /// Request method (first token of the request)
    pub http_query: String,
    /// Request target with the protocol suffix, spaces removed
    pub url: String,
    /// `None` when the status field is not numeric
    pub return_code: Option<u32>,
    pub size: u64,
    pub user_agent: String,
    pub metrics: UrlMetrics,
}

impl HttpRecord {
    /// Records with a missing or zero status code carry no usable signal.
    pub fn has_valid_return_code(&self) -> bool {
        matches!(self.return_code, Some(code) if code > 0)
    }
}

/// A cell of a process table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => FieldValue::Number(v),
            _ => FieldValue::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Number(v) => write!(f, "{}", v),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One row of a process snapshot, keyed by PID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRecord {
    /// 0-based line position in the source file
    pub line: usize,
    pub pid: u32,
    /// Columns in header order, PID excluded
    pub fields: Vec<(String, FieldValue)>,
}

impl ProcessRecord {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, v)| v)
    }
}

/// A structured input unit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
    Http(HttpRecord),
    Process(ProcessRecord),
}

impl Record {
    pub fn key(&self) -> RecordKey {
        match self {
            Record::Http(r) => RecordKey::Line(r.line),
            Record::Process(r) => RecordKey::Pid(r.pid),
        }
    }

    /// Human-readable payload shown in reports
    pub fn payload(&self, columns: &[String]) -> String {
        match self {
            Record::Http(r) => r.raw.clone(),
            Record::Process(r) => columns
                .iter()
                .filter_map(|col| r.field(col).map(|v| format!("{}={}", col, v)))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// How a finding points back to its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKey {
    Line(usize),
    Pid(u32),
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Lines are displayed 1-based, like an editor would
            RecordKey::Line(l) => write!(f, "line {}", l + 1),
            RecordKey::Pid(p) => write!(f, "pid {}", p),
        }
    }
}

/// An anomalous record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Position in the dataset (and the embedding)
    pub index: usize,
    pub key: RecordKey,
    pub severity: Severity,
    /// Cluster label the record was assigned (-1 for noise)
    pub cluster: i64,
    pub payload: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub process_details: BTreeMap<String, String>,
}

/// Summary of findings by severity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindingsSummary {
    pub high: usize,
    pub medium: usize,
    pub total: usize,
}

impl FindingsSummary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = Self::default();
        for f in findings {
            match f.severity {
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
            }
            summary.total += 1;
        }
        summary
    }
}

/// How the clustering stage ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Clustered,
    /// Everything collapsed into one label, even after the default-radius retry
    Degenerate,
}

/// Epsilon bookkeeping for the report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpsilonSummary {
    /// Knee-detected candidate (absent when epsilon was supplied)
    pub knee: Option<f64>,
    /// Value after optional silhouette refinement
    pub selected: Option<f64>,
    /// Radius of the labelling that was kept
    pub used: Option<f64>,
    /// Whether the default-radius retry ran
    pub retried: bool,
}

/// Population of one cluster label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterCount {
    pub label: i64,
    pub count: usize,
}

/// Full result of one scan, as handed to reporters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub log_type: String,
    pub encoding: String,
    pub status: ScanStatus,
    pub records_read: usize,
    pub records_dropped: usize,
    pub dataset_size: usize,
    pub features: Vec<String>,
    pub explained_variance_ratio: Vec<f64>,
    pub epsilon: EpsilonSummary,
    pub silhouette: Option<f64>,
    pub clusters: Vec<ClusterCount>,
    pub minority_clusters: Vec<i64>,
    pub findings: Vec<Finding>,
    pub findings_summary: FindingsSummary,
}

impl ScanReport {
    /// Number of noise points in the kept labelling
    pub fn noise_count(&self) -> usize {
        self.clusters
            .iter()
            .find(|c| c.label == -1)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    /// Highest severity present, if any
    pub fn max_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }
}

/// One embedded point with its label, as exported for plotting tools
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingPoint {
    pub index: usize,
    pub key: RecordKey,
    pub pc_1: f64,
    pub pc_2: f64,
    pub label: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(index: usize, severity: Severity) -> Finding {
        Finding {
            index,
            key: RecordKey::Line(index),
            severity,
            cluster: if severity == Severity::High { -1 } else { 3 },
            payload: String::new(),
            process_details: BTreeMap::new(),
        }
    }

    #[test]
    fn test_severity_ordering_and_parse() {
        assert!(Severity::High > Severity::Medium);
        assert_eq!(Severity::parse("HIGH"), Some(Severity::High));
        assert_eq!(Severity::parse("medium"), Some(Severity::Medium));
        assert_eq!(Severity::parse("critical"), None);
    }

    #[test]
    fn test_findings_summary() {
        let findings = vec![
            finding(0, Severity::High),
            finding(4, Severity::High),
            finding(7, Severity::Medium),
        ];
        let summary = FindingsSummary::from_findings(&findings);
        assert_eq!(summary.high, 2);
        assert_eq!(summary.medium, 1);
        assert_eq!(summary.total, 3);
    }

    #[test]
    fn test_field_value_parse() {
        assert_eq!(FieldValue::parse("12.5"), FieldValue::Number(12.5));
        assert_eq!(
            FieldValue::parse("launchd"),
            FieldValue::Text("launchd".into())
        );
        assert_eq!(FieldValue::parse("NaN"), FieldValue::Text("NaN".into()));
    }

    #[test]
    fn test_record_key_display_is_one_based() {
        assert_eq!(RecordKey::Line(0).to_string(), "line 1");
        assert_eq!(RecordKey::Pid(42).to_string(), "pid 42");
    }

    #[test]
    fn test_process_payload_follows_columns() {
        let record = Record::Process(ProcessRecord {
            line: 3,
            pid: 99,
            fields: vec![
                ("COMMAND".into(), FieldValue::Text("sshd".into())),
                ("%CPU".into(), FieldValue::Number(1.5)),
                ("POWER".into(), FieldValue::Number(0.0)),
            ],
        });
        let payload = record.payload(&["%CPU".to_string(), "POWER".to_string()]);
        assert_eq!(payload, "%CPU=1.5, POWER=0");
        assert_eq!(record.key(), RecordKey::Pid(99));
    }

    #[test]
    fn test_finding_json_shape() {
        let json = serde_json::to_value(finding(2, Severity::High)).unwrap();
        assert_eq!(json["severity"], "high");
        assert_eq!(json["key"]["line"], 2);
        assert!(json.get("process_details").is_none());
    }
}
