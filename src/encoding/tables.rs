//! Dataset-wide categorical tables
//!
//! Built in one pass over every parsed record, before any record is
//! encoded. Each field owns its own table.

use rustc_hash::FxHashMap;

use super::CategoricalEncoding;
use crate::error::{Result, WebhawkError};
use crate::models::HttpRecord;

/// Categorical HTTP fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoricalField {
    Ip,
    HttpQuery,
    UserAgent,
}

impl CategoricalField {
    pub fn name(&self) -> &'static str {
        match self {
            CategoricalField::Ip => "ip",
            CategoricalField::HttpQuery => "http_query",
            CategoricalField::UserAgent => "user_agent",
        }
    }
}

/// Lookup table for one categorical field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldTable {
    /// Value -> 1-based first-seen rank
    Label(FxHashMap<String, usize>),
    /// Value -> occurrence count, with the record total
    Fraction {
        counts: FxHashMap<String, usize>,
        total: usize,
    },
}

impl FieldTable {
    fn build<'a>(encoding: CategoricalEncoding, values: impl Iterator<Item = &'a str>) -> Self {
        match encoding {
            CategoricalEncoding::Label => {
                let mut ranks = FxHashMap::default();
                for value in values {
                    let next = ranks.len() + 1;
                    ranks.entry(value.to_string()).or_insert(next);
                }
                FieldTable::Label(ranks)
            }
            CategoricalEncoding::Fraction => {
                let mut counts: FxHashMap<String, usize> = FxHashMap::default();
                let mut total = 0;
                for value in values {
                    *counts.entry(value.to_string()).or_insert(0) += 1;
                    total += 1;
                }
                FieldTable::Fraction { counts, total }
            }
        }
    }

    /// Number of distinct values
    pub fn len(&self) -> usize {
        match self {
            FieldTable::Label(ranks) => ranks.len(),
            FieldTable::Fraction { counts, .. } => counts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, value: &str) -> Option<f64> {
        match self {
            FieldTable::Label(ranks) => ranks.get(value).map(|&r| r as f64),
            FieldTable::Fraction { counts, total } => counts
                .get(value)
                .filter(|_| *total > 0)
                .map(|&c| c as f64 / *total as f64),
        }
    }
}

/// Tables for the three categorical HTTP fields
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalTables {
    pub encoding: CategoricalEncoding,
    pub ip: FieldTable,
    pub http_query: FieldTable,
    pub user_agent: FieldTable,
}

impl CategoricalTables {
    pub fn build(encoding: CategoricalEncoding, records: &[HttpRecord]) -> Self {
        Self {
            encoding,
            ip: FieldTable::build(encoding, records.iter().map(|r| r.ip.as_str())),
            http_query: FieldTable::build(encoding, records.iter().map(|r| r.http_query.as_str())),
            user_agent: FieldTable::build(encoding, records.iter().map(|r| r.user_agent.as_str())),
        }
    }

    pub fn table(&self, field: CategoricalField) -> &FieldTable {
        match field {
            CategoricalField::Ip => &self.ip,
            CategoricalField::HttpQuery => &self.http_query,
            CategoricalField::UserAgent => &self.user_agent,
        }
    }

    pub fn encode(&self, field: CategoricalField, value: &str) -> Result<f64> {
        let encoded = self.table(field).lookup(value).ok_or_else(|| {
            WebhawkError::Encoding(format!(
                "value '{}' of field '{}' is missing from the {} table",
                value,
                field.name(),
                self.encoding
            ))
        })?;

        Ok(match (self.encoding, field) {
            (CategoricalEncoding::Label, CategoricalField::HttpQuery) => encoded * 100.0,
            _ => encoded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{split_request, UrlMetrics, DEFAULT_SPECIAL_CHARS};
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn record(line: usize, ip: &str, method: &str, agent: &str) -> HttpRecord {
        let (http_query, url) = split_request(&format!("{} / HTTP/1.1", method));
        HttpRecord {
            line,
            raw: String::new(),
            ip: ip.to_string(),
            http_query,
            metrics: UrlMetrics::measure(&url, DEFAULT_SPECIAL_CHARS),
            url,
            return_code: Some(200),
            size: 0,
            user_agent: agent.to_string(),
        }
    }

    fn sample() -> Vec<HttpRecord> {
        let ips = ["10.0.0.1", "10.0.0.2", "10.0.0.3"];
        let methods = ["GET", "POST", "HEAD", "GET"];
        let agents = ["curl", "firefox"];
        (0..40)
            .map(|i| record(i, ips[i % 3], methods[i % 4], agents[i % 2]))
            .collect()
    }

    #[test]
    fn test_label_ranks_follow_first_seen_order() {
        let tables = CategoricalTables::build(CategoricalEncoding::Label, &sample());
        assert_eq!(tables.encode(CategoricalField::Ip, "10.0.0.1").unwrap(), 1.0);
        assert_eq!(tables.encode(CategoricalField::Ip, "10.0.0.3").unwrap(), 3.0);
        assert_eq!(tables.encode(CategoricalField::HttpQuery, "HEAD").unwrap(), 300.0);
        assert_eq!(tables.encode(CategoricalField::UserAgent, "firefox").unwrap(), 2.0);
    }

    #[test]
    fn test_fields_do_not_share_tables() {
        let records = vec![
            record(0, "same", "GET", "same"),
            record(1, "other", "GET", "agent"),
            record(2, "other", "GET", "agent"),
        ];
        let tables = CategoricalTables::build(CategoricalEncoding::Fraction, &records);
        // "same" appears once in each field, never twice in one
        assert!((tables.encode(CategoricalField::Ip, "same").unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert!(
            (tables.encode(CategoricalField::UserAgent, "same").unwrap() - 1.0 / 3.0).abs() < 1e-12
        );
        assert_eq!(tables.encode(CategoricalField::HttpQuery, "GET").unwrap(), 1.0);
    }

    #[test]
    fn test_tables_invariant_under_shuffle_then_restore() {
        let original = sample();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut order: Vec<usize> = (0..original.len()).collect();
        order.shuffle(&mut rng);

        let shuffled: Vec<HttpRecord> = order.iter().map(|&i| original[i].clone()).collect();
        let mut restored = shuffled.clone();
        restored.sort_by_key(|r| r.line);

        for encoding in [CategoricalEncoding::Label, CategoricalEncoding::Fraction] {
            let before = CategoricalTables::build(encoding, &original);
            let after = CategoricalTables::build(encoding, &restored);
            assert_eq!(before, after);
        }

        // Frequencies do not depend on order at all
        let fraction = CategoricalTables::build(CategoricalEncoding::Fraction, &original);
        let fraction_shuffled = CategoricalTables::build(CategoricalEncoding::Fraction, &shuffled);
        assert_eq!(fraction, fraction_shuffled);
    }

    #[test]
    fn test_empty_input_builds_empty_tables() {
        let tables = CategoricalTables::build(CategoricalEncoding::Fraction, &[]);
        assert!(tables.ip.is_empty());
        assert!(tables.encode(CategoricalField::Ip, "10.0.0.1").is_err());
    }
}
