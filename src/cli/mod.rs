//! CLI command definitions and handlers

mod init;
mod scan;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use console::style;
use std::path::PathBuf;

use crate::config::{load_project_config, RunConfig};
use crate::parsers::LogType;

/// Webhawk - unsupervised anomaly detection for logs
#[derive(Parser, Debug)]
#[command(name = "webhawk")]
#[command(
    version,
    about = "Unsupervised anomaly detection for web access logs and OS process snapshots",
    long_about = "Webhawk turns every log record into a feature vector, projects the \
vectors to 2-D with PCA and clusters them with DBSCAN. Noise points are reported \
as high severity, members of unusually small clusters as medium severity.\n\n\
No training data and no rules are needed.",
    after_help = "\
Examples:
  webhawk scan access.log -l apache                     Scan an Apache access log
  webhawk scan access.log -l nginx --format json        JSON output for scripting
  webhawk scan top.txt -l os_processes --no-enrich      Scan a process snapshot
  webhawk scan access.log -l apache --eps 0.05          Fixed neighbourhood radius
  webhawk scan access.log -l apache --fail-on high      Exit code 1 on any high finding
  webhawk init                                          Write an example webhawk.toml"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a log file for anomalous records
    Scan(ScanArgs),

    /// Write an example webhawk.toml to the current directory
    Init,

    /// List the known log formats and their patterns
    Formats,
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Log file to scan
    pub log_file: PathBuf,

    /// Kind of input: apache, nginx, os_processes, custom
    #[arg(long, short = 'l', value_parser = ["apache", "nginx", "os_processes", "custom"])]
    pub log_type: String,

    /// Fixed DBSCAN radius (default: knee of the nearest-neighbour curve)
    #[arg(long)]
    pub eps: Option<f64>,

    /// Minimum neighbours (self included) of a core point
    #[arg(long)]
    pub min_samples: Option<usize>,

    /// Keep at most this many records
    #[arg(long)]
    pub max_records: Option<usize>,

    /// Step of the silhouette sweep
    #[arg(long)]
    pub lambda_step: Option<f64>,

    /// Clusters up to this size (plus the noise count) are minority clusters
    #[arg(long)]
    pub minority_threshold: Option<usize>,

    /// Scale every feature to zero mean and unit variance before PCA
    #[arg(long)]
    pub standardize: bool,

    /// Refine epsilon by maximising the silhouette score
    #[arg(long)]
    pub optimize_silhouette: bool,

    /// Encode categorical fields by first-seen rank instead of frequency
    #[arg(long)]
    pub label_encoding: bool,

    /// Output format: text, json, html
    #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json", "html"])]
    pub format: String,

    /// Output file path (default: stdout, or scan_result_<file>.html for html)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Write the labelled 2-D embedding as JSON
    #[arg(long)]
    pub export_embedding: Option<PathBuf>,

    /// Do not look up live details of flagged processes
    #[arg(long)]
    pub no_enrich: bool,

    /// Exit with code 1 if findings at this severity or higher exist
    #[arg(long, value_parser = ["high", "medium"])]
    pub fail_on: Option<String>,

    /// Config file (default: ./webhawk.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Run the CLI command
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Scan(args) => scan::run(&args),
        Commands::Init => init::run(&std::env::current_dir()?),
        Commands::Formats => run_formats(),
    }
}

fn run_formats() -> Result<()> {
    let project = load_project_config(&std::env::current_dir()?, None);
    let config = RunConfig::from_project(&project)?;

    println!("\n{}\n", style("Log formats").bold());
    for log_type in LogType::ALL {
        let pattern = if log_type.is_access_log() {
            config
                .formats
                .get(log_type.name())
                .map(String::as_str)
                .or_else(|| log_type.builtin_pattern())
                .unwrap_or("(define [formats] custom in webhawk.toml)")
                .to_string()
        } else {
            "top-style table: header with PID and %CPU, fixed-width columns".to_string()
        };
        println!("  {:<14} {}", style(log_type.name()).cyan(), pattern);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_flags_parse() {
        let cli = Cli::try_parse_from([
            "webhawk",
            "scan",
            "access.log",
            "-l",
            "nginx",
            "--eps",
            "0.25",
            "--optimize-silhouette",
            "--fail-on",
            "medium",
            "--format",
            "json",
        ])
        .unwrap();
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.log_type, "nginx");
        assert_eq!(args.eps, Some(0.25));
        assert!(args.optimize_silhouette);
        assert!(!args.standardize);
        assert_eq!(args.fail_on.as_deref(), Some("medium"));
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_unknown_log_type_rejected() {
        assert!(Cli::try_parse_from(["webhawk", "scan", "a.log", "-l", "iis"]).is_err());
    }

    #[test]
    fn test_log_level_is_global() {
        let cli = Cli::try_parse_from(["webhawk", "formats", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, "debug");
    }
}
