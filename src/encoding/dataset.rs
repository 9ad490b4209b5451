//! Dataset assembly
//!
//! Collects encoded vectors with a stable index back to the records they
//! came from. The index is the only addressing scheme used downstream.

use tracing::{debug, info};

use super::{FeatureEncoder, FeatureVector};
use crate::config::RunConfig;
use crate::error::Result;
use crate::models::{HttpRecord, ProcessRecord, Record};

/// One dataset row
#[derive(Debug, Clone)]
pub struct DatasetEntry {
    pub index: usize,
    pub vector: FeatureVector,
    pub record: Record,
}

/// Ordered, immutable collection of encoded records
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    entries: Vec<DatasetEntry>,
    feature_names: Vec<String>,
    /// Records removed during encoding (invalid status codes)
    dropped: usize,
    /// Records removed by the record cap
    truncated: usize,
}

impl Dataset {
    /// Encode access-log records.
    ///
    /// Categorical tables are built over every record handed in, including
    /// the ones dropped afterwards for a bad status code.
    pub fn from_http(records: Vec<HttpRecord>, config: &RunConfig) -> Result<Self> {
        let encoder = FeatureEncoder::fit(config.encoding, &config.features, &records);
        debug!(
            "Categorical tables: {} ips, {} methods, {} user agents",
            encoder.tables().ip.len(),
            encoder.tables().http_query.len(),
            encoder.tables().user_agent.len()
        );

        let mut vectors = Vec::with_capacity(records.len());
        let mut dropped = 0;
        for record in records {
            match encoder.encode(&record)? {
                Some(vector) => vectors.push((vector, Record::Http(record))),
                None => dropped += 1,
            }
        }

        let feature_names = config.features.iter().map(|f| f.name().to_string()).collect();
        Ok(Self::assemble(vectors, feature_names, dropped, config.max_records))
    }

    /// Encode process-table rows.
    ///
    /// Feature columns are the ones numeric in every row that carries them,
    /// in header order, minus the configured exclusions. A row without a
    /// feature column gets 0 in it.
    pub fn from_processes(records: Vec<ProcessRecord>, config: &RunConfig) -> Result<Self> {
        let columns = numeric_columns(&records, &config.excluded_process_columns);
        debug!("Process feature columns: {:?}", columns);

        let vectors = records
            .into_iter()
            .map(|record| {
                let vector = columns
                    .iter()
                    .map(|col| record.field(col).and_then(|v| v.as_f64()).unwrap_or(0.0))
                    .collect();
                (vector, Record::Process(record))
            })
            .collect();

        Ok(Self::assemble(vectors, columns, 0, config.max_records))
    }

    fn assemble(
        mut vectors: Vec<(FeatureVector, Record)>,
        feature_names: Vec<String>,
        dropped: usize,
        max_records: usize,
    ) -> Self {
        let truncated = vectors.len().saturating_sub(max_records);
        if truncated > 0 {
            info!("Record cap reached: keeping the first {} records", max_records);
            vectors.truncate(max_records);
        }

        let entries = vectors
            .into_iter()
            .enumerate()
            .map(|(index, (vector, record))| DatasetEntry {
                index,
                vector,
                record,
            })
            .collect();

        Self {
            entries,
            feature_names,
            dropped,
            truncated,
        }
    }

    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&DatasetEntry> {
        self.entries.get(index)
    }

    /// Feature vectors in index order
    pub fn rows(&self) -> Vec<&[f64]> {
        self.entries.iter().map(|e| e.vector.as_slice()).collect()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn dimension(&self) -> usize {
        self.feature_names.len()
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn truncated(&self) -> usize {
        self.truncated
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn numeric_columns(records: &[ProcessRecord], excluded: &[String]) -> Vec<String> {
    let mut seen: Vec<&str> = Vec::new();
    for record in records {
        for (col, _) in &record.fields {
            if !seen.contains(&col.as_str()) {
                seen.push(col);
            }
        }
    }

    seen.into_iter()
        .filter(|col| *col != "PID" && !excluded.iter().any(|e| e == col))
        .filter(|col| {
            records
                .iter()
                .all(|r| r.field(col).map_or(true, |v| v.as_f64().is_some()))
        })
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{split_request, UrlMetrics, DEFAULT_SPECIAL_CHARS};
    use crate::models::FieldValue;

    fn http(line: usize, path: &str, status: Option<u32>) -> HttpRecord {
        let (http_query, url) = split_request(&format!("GET {} HTTP/1.1", path));
        HttpRecord {
            line,
            raw: format!("line {}", line),
            ip: "10.0.0.1".into(),
            http_query,
            metrics: UrlMetrics::measure(&url, DEFAULT_SPECIAL_CHARS),
            url,
            return_code: status,
            size: 0,
            user_agent: "curl".into(),
        }
    }

    fn process(line: usize, pid: u32, cpu: f64, command: &str) -> ProcessRecord {
        ProcessRecord {
            line,
            pid,
            fields: vec![
                ("COMMAND".into(), FieldValue::Text(command.into())),
                ("%CPU".into(), FieldValue::Number(cpu)),
                ("PPID".into(), FieldValue::Number(1.0)),
                ("POWER".into(), FieldValue::Number(cpu * 2.0)),
            ],
        }
    }

    #[test]
    fn test_http_dataset_drops_bad_status_and_keeps_order() {
        let records = vec![
            http(0, "/a", Some(200)),
            http(1, "/b", None),
            http(2, "/c", Some(404)),
            http(3, "/d", Some(0)),
            http(4, "/e", Some(500)),
        ];
        let input_len = records.len();
        let dataset = Dataset::from_http(records, &RunConfig::default()).unwrap();

        assert!(dataset.len() <= input_len);
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.dropped(), 2);
        let lines: Vec<usize> = dataset
            .entries()
            .iter()
            .map(|e| match &e.record {
                Record::Http(r) => r.line,
                Record::Process(_) => unreachable!(),
            })
            .collect();
        assert_eq!(lines, vec![0, 2, 4]);
        for (i, e) in dataset.entries().iter().enumerate() {
            assert_eq!(e.index, i);
            assert_eq!(e.vector.len(), dataset.dimension());
        }
    }

    #[test]
    fn test_record_cap_truncates_after_encoding() {
        let records = (0..10).map(|i| http(i, "/x", Some(200))).collect();
        let config = RunConfig {
            max_records: 4,
            ..RunConfig::default()
        };
        let dataset = Dataset::from_http(records, &config).unwrap();
        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.truncated(), 6);
    }

    #[test]
    fn test_process_columns_exclude_text_and_configured() {
        let records = vec![process(0, 10, 1.0, "sshd"), process(1, 11, 3.0, "nginx")];
        let dataset = Dataset::from_processes(records, &RunConfig::default()).unwrap();
        assert_eq!(dataset.feature_names(), &["%CPU".to_string(), "POWER".to_string()]);
        assert_eq!(dataset.entries()[1].vector, vec![3.0, 6.0]);
    }

    #[test]
    fn test_process_column_must_be_numeric_everywhere() {
        let mut odd = process(1, 11, 3.0, "nginx");
        odd.fields[3].1 = FieldValue::Text("n/a".into());
        let records = vec![process(0, 10, 1.0, "sshd"), odd];
        let dataset = Dataset::from_processes(records, &RunConfig::default()).unwrap();
        assert_eq!(dataset.feature_names(), &["%CPU".to_string()]);
    }

    #[test]
    fn test_process_column_absent_from_some_rows_is_zero_filled() {
        // snapshots from two tools: only one reports POWER, only the other RSS
        let mut top = process(0, 10, 1.0, "sshd");
        top.fields.push(("RSS".into(), FieldValue::Number(512.0)));
        let mut ps = process(1, 11, 3.0, "nginx");
        ps.fields.retain(|(col, _)| col != "POWER");
        let records = vec![top, ps];

        let dataset = Dataset::from_processes(records, &RunConfig::default()).unwrap();
        assert_eq!(
            dataset.feature_names(),
            &["%CPU".to_string(), "POWER".to_string(), "RSS".to_string()]
        );
        assert_eq!(dataset.entries()[0].vector, vec![1.0, 2.0, 512.0]);
        assert_eq!(dataset.entries()[1].vector, vec![3.0, 0.0, 0.0]);
    }
}
