//! Scan command - run the detection pipeline over one file

use anyhow::{Context, Result};
use console::style;
use std::path::{Path, PathBuf};
use tracing::info;

use super::ScanArgs;
use crate::config::{load_project_config, RunConfig};
use crate::encoding::CategoricalEncoding;
use crate::models::{ScanReport, ScanStatus, Severity};
use crate::parsers::LogType;
use crate::pipeline::Pipeline;
use crate::reporters::{self, OutputFormat};

/// Run the scan command
pub fn run(args: &ScanArgs) -> Result<()> {
    let log_type = LogType::from_name(&args.log_type)
        .with_context(|| format!("Unknown log type: {}", args.log_type))?;
    if !args.log_file.is_file() {
        anyhow::bail!("Log file does not exist: {}", args.log_file.display());
    }

    let config = build_config(args)?;
    let pipeline = Pipeline::new(config);
    let output = pipeline
        .scan_file(&args.log_file, log_type)
        .with_context(|| format!("Scan of {} failed", args.log_file.display()))?;
    info!("Scan finished: {}", output.summary());

    if let Some(path) = &args.export_embedding {
        let json = reporters::render_embedding(&output.embedding_points())?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write embedding to {}", path.display()))?;
        eprintln!(
            "Embedding written to: {}",
            style(path.display()).cyan()
        );
    }

    let format: OutputFormat = args.format.parse()?;
    write_report(&output.report, format, output_path(args, format).as_deref())?;

    check_fail_threshold(&args.fail_on, &output.report);
    Ok(())
}

/// Defaults, then the project file, then command-line flags
fn build_config(args: &ScanArgs) -> Result<RunConfig> {
    let cwd = std::env::current_dir()?;
    let project = load_project_config(&cwd, args.config.as_deref());
    let mut config = RunConfig::from_project(&project)?;

    if args.eps.is_some() {
        config.eps = args.eps;
    }
    if let Some(n) = args.min_samples {
        config.min_samples = n;
    }
    if let Some(n) = args.max_records {
        config.max_records = n;
    }
    if let Some(step) = args.lambda_step {
        config.lambda_step = step;
    }
    if let Some(t) = args.minority_threshold {
        config.minority_threshold = t;
    }
    config.standardize |= args.standardize;
    config.optimize_silhouette |= args.optimize_silhouette;
    if args.label_encoding {
        config.encoding = CategoricalEncoding::Label;
    }
    if args.no_enrich {
        config.enrich = false;
    }

    config.validate()?;
    Ok(config)
}

/// Explicit `--output`, or an auto-named file for html
fn output_path(args: &ScanArgs, format: OutputFormat) -> Option<PathBuf> {
    match (&args.output, format) {
        (Some(p), _) => Some(p.clone()),
        (None, OutputFormat::Html) => Some(default_html_path(&args.log_file)),
        (None, _) => None,
    }
}

fn default_html_path(log_file: &Path) -> PathBuf {
    let name = log_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string());
    PathBuf::from(format!("scan_result_{}.{}", name, reporters::file_extension(OutputFormat::Html)))
}

fn write_report(report: &ScanReport, format: OutputFormat, path: Option<&Path>) -> Result<()> {
    let rendered = reporters::report_with_format(report, format)?;

    match path {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            // stderr keeps stdout clean for machine-readable formats
            eprintln!("Report written to: {}", style(path.display()).cyan());
        }
        None => println!("{}", rendered),
    }

    if report.status == ScanStatus::Degenerate {
        eprintln!(
            "{} clustering collapsed to a single label; no findings",
            style("note:").yellow()
        );
    }
    Ok(())
}

/// Exit with code 1 when a finding reaches the `--fail-on` severity
fn check_fail_threshold(fail_on: &Option<String>, report: &ScanReport) {
    let Some(threshold) = fail_on.as_deref().and_then(Severity::parse) else {
        return;
    };
    if report.max_severity().is_some_and(|max| max >= threshold) {
        eprintln!("Failing due to --fail-on={} threshold", threshold);
        std::process::exit(1);
    }
}
