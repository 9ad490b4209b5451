//! Init command - write an example project configuration

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use crate::config::CONFIG_FILE_NAME;

const EXAMPLE_CONFIG: &str = r#"# Webhawk configuration
# Command-line flags override the values below.

[detection]
# Categorical encoding: "fraction" (occurrence frequency) or "label" (first-seen rank)
encoding = "fraction"

# Fixed DBSCAN radius; leave unset to use the knee of the nearest-neighbour curve
# eps = 0.05

# Minimum neighbours (the point itself included) of a core point
min_samples = 2

# Clusters of at most this size plus the noise count are reported as medium
minority_threshold = 5

# Refine epsilon with a silhouette sweep up to sweep_ceiling x the start value
optimize_silhouette = false
lambda_step = 0.01
sweep_ceiling = 1.5

# Scale features to zero mean and unit variance before PCA
standardize = false

max_records = 1000000

[features]
# HTTP features, in vector order
http = ["params_number", "length", "upper_cases", "lower_cases", "special_chars", "url_depth", "user_agent", "http_query", "ip", "return_code"]

# Process table columns never used as features
exclude_process_columns = ["PGRP", "PPID", "UID"]

[formats]
# Extra access-log formats; required named groups: ip, request, status, size, user_agent
# custom = '^(?P<ip>\S+) \S+ \S+ \[[^\]]*\] "(?P<request>[^"]*)" (?P<status>\d+|-) (?P<size>\d+|-) "[^"]*" "(?P<user_agent>[^"]*)"'

[enrichment]
# Look up live details of flagged processes in /proc
enabled = true
attributes = ["name", "status", "ppid", "uid", "threads", "rss_kb", "cmdline", "exe"]
"#;

/// Run the init command
pub fn run(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Path is not a directory: {}", dir.display());
    }

    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        anyhow::bail!(
            "{} already exists; remove it first to write a fresh example",
            config_path.display()
        );
    }

    std::fs::write(&config_path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to create {}", config_path.display()))?;
    println!(
        "{} Created {}",
        style("✓").green(),
        style(config_path.display()).cyan()
    );

    println!("\nNext steps:");
    println!("  {} Scan an access log", style("webhawk scan access.log -l apache").cyan());
    println!("  {} List log formats", style("webhawk formats").cyan());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_project_config, RunConfig};

    #[test]
    fn test_example_config_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path()).unwrap();

        let project = load_project_config(dir.path(), None);
        let config = RunConfig::from_project(&project).unwrap();
        config.validate().unwrap();
        assert_eq!(config.features.len(), 10);
        assert_eq!(config.enrichment_attributes.len(), 8);
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "# mine\n").unwrap();
        assert!(run(dir.path()).is_err());
        let kept = std::fs::read_to_string(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(kept, "# mine\n");
    }
}
