//! Feature encoding
//!
//! Turns structured records into fixed-schema numeric feature vectors.
//! Categorical fields go through a dataset-wide table built in a first
//! pass; derived URL metrics are measured straight from the request text.

mod dataset;
mod metrics;
mod tables;

pub use dataset::{Dataset, DatasetEntry};
pub use metrics::{split_request, UrlMetrics, DEFAULT_SPECIAL_CHARS};
pub use tables::{CategoricalField, CategoricalTables, FieldTable};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::HttpRecord;

/// Ordered numeric tuple over the configured feature schema
pub type FeatureVector = Vec<f64>;

/// How categorical fields (`ip`, `http_query`, `user_agent`) become numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoricalEncoding {
    /// 1-based first-seen rank (`http_query` rank scaled by 100)
    Label,
    /// Empirical occurrence frequency over the full dataset
    #[default]
    Fraction,
}

impl std::fmt::Display for CategoricalEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoricalEncoding::Label => write!(f, "label_encoding"),
            CategoricalEncoding::Fraction => write!(f, "fraction_encoding"),
        }
    }
}

/// Named features available for HTTP records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpFeature {
    ParamsNumber,
    Length,
    UpperCases,
    LowerCases,
    SpecialChars,
    UrlDepth,
    UserAgent,
    HttpQuery,
    Ip,
    ReturnCode,
    Size,
}

/// `size` is left out: response sizes flag too many benign downloads.
pub const DEFAULT_HTTP_FEATURES: &[HttpFeature] = &[
    HttpFeature::ParamsNumber,
    HttpFeature::Length,
    HttpFeature::UpperCases,
    HttpFeature::LowerCases,
    HttpFeature::SpecialChars,
    HttpFeature::UrlDepth,
    HttpFeature::UserAgent,
    HttpFeature::HttpQuery,
    HttpFeature::Ip,
    HttpFeature::ReturnCode,
];

impl HttpFeature {
    pub const ALL: &'static [HttpFeature] = &[
        HttpFeature::ParamsNumber,
        HttpFeature::Length,
        HttpFeature::UpperCases,
        HttpFeature::LowerCases,
        HttpFeature::SpecialChars,
        HttpFeature::UrlDepth,
        HttpFeature::UserAgent,
        HttpFeature::HttpQuery,
        HttpFeature::Ip,
        HttpFeature::ReturnCode,
        HttpFeature::Size,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HttpFeature::ParamsNumber => "params_number",
            HttpFeature::Length => "length",
            HttpFeature::UpperCases => "upper_cases",
            HttpFeature::LowerCases => "lower_cases",
            HttpFeature::SpecialChars => "special_chars",
            HttpFeature::UrlDepth => "url_depth",
            HttpFeature::UserAgent => "user_agent",
            HttpFeature::HttpQuery => "http_query",
            HttpFeature::Ip => "ip",
            HttpFeature::ReturnCode => "return_code",
            HttpFeature::Size => "size",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }
}

impl std::fmt::Display for HttpFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Encodes HTTP records against dataset-wide categorical tables.
///
/// Pure once fitted: the same record always yields the same vector.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    features: Vec<HttpFeature>,
    tables: CategoricalTables,
}

impl FeatureEncoder {
    /// First pass: build the categorical tables over every parsed record.
    pub fn fit(encoding: CategoricalEncoding, features: &[HttpFeature], records: &[HttpRecord]) -> Self {
        Self {
            features: features.to_vec(),
            tables: CategoricalTables::build(encoding, records),
        }
    }

    pub fn tables(&self) -> &CategoricalTables {
        &self.tables
    }

    /// Second pass: one record to one vector.
    ///
    /// Returns `Ok(None)` when the record must be dropped (status code
    /// missing or not positive).
    pub fn encode(&self, record: &HttpRecord) -> Result<Option<FeatureVector>> {
        let return_code = match record.return_code {
            Some(code) if code > 0 => code,
            _ => return Ok(None),
        };

        let m = &record.metrics;
        let mut vector = Vec::with_capacity(self.features.len());
        for feature in &self.features {
            let value = match feature {
                HttpFeature::ParamsNumber => m.params_number as f64,
                HttpFeature::Length => m.length as f64,
                HttpFeature::UpperCases => m.upper_cases as f64,
                HttpFeature::LowerCases => m.lower_cases as f64,
                HttpFeature::SpecialChars => m.special_chars as f64,
                HttpFeature::UrlDepth => m.url_depth as f64,
                HttpFeature::ReturnCode => return_code as f64,
                HttpFeature::Size => record.size as f64,
                HttpFeature::UserAgent => {
                    self.tables.encode(CategoricalField::UserAgent, &record.user_agent)?
                }
                HttpFeature::HttpQuery => {
                    self.tables.encode(CategoricalField::HttpQuery, &record.http_query)?
                }
                HttpFeature::Ip => self.tables.encode(CategoricalField::Ip, &record.ip)?,
            };
            vector.push(value);
        }
        Ok(Some(vector))
    }
}
