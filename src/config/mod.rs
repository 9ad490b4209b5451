//! Configuration module for Webhawk
//!
//! This module handles:
//! - Project-level configuration (webhawk.toml)
//! - The immutable per-run configuration handed to every stage
//! - Validation of user-supplied parameters

mod project_config;

pub use project_config::{
    load_project_config, DetectionConfig, EnrichmentConfig, FeaturesConfig, ProjectConfig,
    CONFIG_FILE_NAME,
};

use std::collections::BTreeMap;

use crate::encoding::{CategoricalEncoding, HttpFeature, DEFAULT_HTTP_FEATURES, DEFAULT_SPECIAL_CHARS};
use crate::enrich::DEFAULT_ATTRIBUTES;
use crate::error::{Result, WebhawkError};
use crate::parsers::{AccessLogFormat, LogType};

pub const DEFAULT_MIN_SAMPLES: usize = 2;
pub const DEFAULT_MINORITY_THRESHOLD: usize = 5;
pub const DEFAULT_LAMBDA_STEP: f64 = 0.01;
pub const DEFAULT_SWEEP_CEILING: f64 = 1.5;
pub const DEFAULT_KNEE_SENSITIVITY: f64 = 10.0;
/// Radius of the retry run when the selected epsilon gives a single label
pub const DEFAULT_RADIUS: f64 = 0.5;
pub const DEFAULT_MAX_RECORDS: usize = 1_000_000;
pub const DEFAULT_EXCLUDED_PROCESS_COLUMNS: &[&str] = &["PGRP", "PPID", "UID"];

/// Everything one scan needs to know, built once at startup
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub encoding: CategoricalEncoding,
    /// Fixed epsilon; `None` means knee detection
    pub eps: Option<f64>,
    pub min_samples: usize,
    pub minority_threshold: usize,
    pub optimize_silhouette: bool,
    pub lambda_step: f64,
    pub sweep_ceiling: f64,
    pub knee_sensitivity: f64,
    pub default_radius: f64,
    pub standardize: bool,
    pub max_records: usize,
    pub features: Vec<HttpFeature>,
    pub special_chars: String,
    pub excluded_process_columns: Vec<String>,
    pub enrich: bool,
    pub enrichment_attributes: Vec<String>,
    /// Access-log regexes that override or extend the built-in ones
    pub formats: BTreeMap<String, String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            encoding: CategoricalEncoding::default(),
            eps: None,
            min_samples: DEFAULT_MIN_SAMPLES,
            minority_threshold: DEFAULT_MINORITY_THRESHOLD,
            optimize_silhouette: false,
            lambda_step: DEFAULT_LAMBDA_STEP,
            sweep_ceiling: DEFAULT_SWEEP_CEILING,
            knee_sensitivity: DEFAULT_KNEE_SENSITIVITY,
            default_radius: DEFAULT_RADIUS,
            standardize: false,
            max_records: DEFAULT_MAX_RECORDS,
            features: DEFAULT_HTTP_FEATURES.to_vec(),
            special_chars: DEFAULT_SPECIAL_CHARS.to_string(),
            excluded_process_columns: DEFAULT_EXCLUDED_PROCESS_COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            enrich: true,
            enrichment_attributes: DEFAULT_ATTRIBUTES.iter().map(|s| s.to_string()).collect(),
            formats: BTreeMap::new(),
        }
    }
}

impl RunConfig {
    /// Layer a project file over the built-in defaults.
    pub fn from_project(project: &ProjectConfig) -> Result<Self> {
        let defaults = Self::default();
        let d = &project.detection;

        let features = match &project.features.http {
            Some(names) => names
                .iter()
                .map(|name| {
                    HttpFeature::from_name(name).ok_or_else(|| {
                        WebhawkError::InvalidConfig(format!("unknown feature '{}'", name))
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            None => defaults.features,
        };

        Ok(Self {
            encoding: d.encoding.unwrap_or(defaults.encoding),
            eps: d.eps.or(defaults.eps),
            min_samples: d.min_samples.unwrap_or(defaults.min_samples),
            minority_threshold: d.minority_threshold.unwrap_or(defaults.minority_threshold),
            optimize_silhouette: d.optimize_silhouette.unwrap_or(defaults.optimize_silhouette),
            lambda_step: d.lambda_step.unwrap_or(defaults.lambda_step),
            sweep_ceiling: d.sweep_ceiling.unwrap_or(defaults.sweep_ceiling),
            knee_sensitivity: d.knee_sensitivity.unwrap_or(defaults.knee_sensitivity),
            default_radius: d.default_radius.unwrap_or(defaults.default_radius),
            standardize: d.standardize.unwrap_or(defaults.standardize),
            max_records: d.max_records.unwrap_or(defaults.max_records),
            features,
            special_chars: project
                .features
                .special_chars
                .clone()
                .unwrap_or(defaults.special_chars),
            excluded_process_columns: project
                .features
                .exclude_process_columns
                .clone()
                .unwrap_or(defaults.excluded_process_columns),
            enrich: project.enrichment.enabled.unwrap_or(defaults.enrich),
            enrichment_attributes: project
                .enrichment
                .attributes
                .clone()
                .unwrap_or(defaults.enrichment_attributes),
            formats: project.formats.clone(),
        })
    }

    /// Reject parameter combinations no stage can work with.
    pub fn validate(&self) -> Result<()> {
        if let Some(eps) = self.eps {
            if !(eps > 0.0 && eps.is_finite()) {
                return Err(invalid(format!("eps must be positive, got {}", eps)));
            }
        }
        if self.min_samples == 0 {
            return Err(invalid("min_samples must be at least 1".to_string()));
        }
        if !(self.lambda_step > 0.0 && self.lambda_step.is_finite()) {
            return Err(invalid(format!(
                "lambda_step must be positive, got {}",
                self.lambda_step
            )));
        }
        if !(self.sweep_ceiling >= 1.0 && self.sweep_ceiling.is_finite()) {
            return Err(invalid(format!(
                "sweep_ceiling must be at least 1.0, got {}",
                self.sweep_ceiling
            )));
        }
        if !(self.knee_sensitivity >= 0.0 && self.knee_sensitivity.is_finite()) {
            return Err(invalid(format!(
                "knee_sensitivity must not be negative, got {}",
                self.knee_sensitivity
            )));
        }
        if !(self.default_radius > 0.0 && self.default_radius.is_finite()) {
            return Err(invalid(format!(
                "default_radius must be positive, got {}",
                self.default_radius
            )));
        }
        if self.max_records == 0 {
            return Err(invalid("max_records must be at least 1".to_string()));
        }
        if self.features.is_empty() {
            return Err(invalid("the HTTP feature list is empty".to_string()));
        }
        for (name, pattern) in &self.formats {
            AccessLogFormat::compile(name, pattern)?;
        }
        Ok(())
    }

    /// Access-log format for a log type: project override first, then built-in.
    pub fn access_log_format(&self, log_type: LogType) -> Result<AccessLogFormat> {
        let name = log_type.name();
        let pattern = self
            .formats
            .get(name)
            .map(String::as_str)
            .or_else(|| log_type.builtin_pattern())
            .ok_or_else(|| {
                invalid(format!(
                    "log type '{}' has no pattern; define it under [formats] in {}",
                    name, CONFIG_FILE_NAME
                ))
            })?;
        AccessLogFormat::compile(name, pattern)
    }
}

fn invalid(msg: String) -> WebhawkError {
    WebhawkError::InvalidConfig(msg)
}
