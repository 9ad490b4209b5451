//! Project-level configuration support
//!
//! Loads per-project configuration from `webhawk.toml` in the working
//! directory, or from a file given with `--config`.
//!
//! # Configuration Format
//!
//! ```toml
//! # webhawk.toml
//!
//! [detection]
//! encoding = "fraction"        # or "label"
//! min_samples = 2
//! minority_threshold = 5
//! optimize_silhouette = false
//! lambda_step = 0.01
//! sweep_ceiling = 1.5
//! standardize = false
//! max_records = 1000000
//!
//! [features]
//! http = ["params_number", "length", "url_depth", "ip", "return_code"]
//! exclude_process_columns = ["PGRP", "PPID", "UID"]
//!
//! [formats]
//! custom = '^(?P<ip>\S+) .*"(?P<request>[^"]*)" (?P<status>\d+|-) (?P<size>\d+|-) "(?P<user_agent>[^"]*)"$'
//!
//! [enrichment]
//! enabled = true
//! attributes = ["name", "status", "cmdline"]
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::encoding::CategoricalEncoding;

/// Name of the project configuration file
pub const CONFIG_FILE_NAME: &str = "webhawk.toml";

/// Project-level configuration loaded from webhawk.toml
///
/// Every value is optional: unset keys fall back to the built-in defaults
/// of [`RunConfig`](crate::config::RunConfig).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
    /// Clustering and classification parameters
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Feature schema
    #[serde(default)]
    pub features: FeaturesConfig,

    /// Access-log regexes keyed by log type name
    #[serde(default)]
    pub formats: BTreeMap<String, String>,

    /// Process enrichment
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

/// `[detection]` section
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DetectionConfig {
    #[serde(default)]
    pub encoding: Option<CategoricalEncoding>,

    /// Fixed neighbourhood radius (skips knee detection)
    #[serde(default)]
    pub eps: Option<f64>,

    #[serde(default)]
    pub min_samples: Option<usize>,

    #[serde(default)]
    pub minority_threshold: Option<usize>,

    #[serde(default)]
    pub optimize_silhouette: Option<bool>,

    /// Additive step of the silhouette sweep
    #[serde(default)]
    pub lambda_step: Option<f64>,

    /// Upper bound of the sweep, as a multiple of its start
    #[serde(default)]
    pub sweep_ceiling: Option<f64>,

    /// Kneedle sensitivity `S`
    #[serde(default)]
    pub knee_sensitivity: Option<f64>,

    /// Radius used when retrying a degenerate clustering
    #[serde(default)]
    pub default_radius: Option<f64>,

    #[serde(default)]
    pub standardize: Option<bool>,

    #[serde(default)]
    pub max_records: Option<usize>,
}

/// `[features]` section
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FeaturesConfig {
    /// HTTP feature names, in vector order
    #[serde(default)]
    pub http: Option<Vec<String>>,

    /// Characters counted by `special_chars`
    #[serde(default)]
    pub special_chars: Option<String>,

    /// Process columns never used as features
    #[serde(default)]
    pub exclude_process_columns: Option<Vec<String>>,
}

/// `[enrichment]` section
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EnrichmentConfig {
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Attributes looked up per PID
    #[serde(default)]
    pub attributes: Option<Vec<String>>,
}

/// Load project configuration.
///
/// With an explicit path that file is read; otherwise `webhawk.toml` is
/// looked up in `dir`. A missing or malformed file is reported and the
/// defaults are used.
pub fn load_project_config(dir: &Path, explicit: Option<&Path>) -> ProjectConfig {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => dir.join(CONFIG_FILE_NAME),
    };

    if !path.exists() {
        if explicit.is_some() {
            warn!("Config file {} not found, using defaults", path.display());
        } else {
            debug!("No project config found, using defaults");
        }
        return ProjectConfig::default();
    }

    match load_toml_config(&path) {
        Ok(config) => {
            debug!("Loaded project config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Failed to load {}: {}", path.display(), e);
            ProjectConfig::default()
        }
    }
}

/// Load configuration from a TOML file
fn load_toml_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = toml::from_str(&content)?;
    Ok(config)
}
