//! Text (terminal) reporter with colors and formatting

use crate::models::{Finding, ScanReport, ScanStatus, Severity};
use anyhow::Result;

/// Severity colors
fn severity_color(severity: &Severity) -> &'static str {
    match severity {
        Severity::High => "\x1b[91m",   // Light red
        Severity::Medium => "\x1b[33m", // Yellow
    }
}

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Findings shown per severity before the rest is summarised
const MAX_LISTED: usize = 20;

/// Severity tag
fn severity_tag(severity: &Severity) -> &'static str {
    match severity {
        Severity::High => "[H]",
        Severity::Medium => "[M]",
    }
}

/// Render report as formatted terminal output
pub fn render(report: &ScanReport) -> Result<String> {
    let mut out = String::new();

    // Header
    out.push_str(&format!("\n{BOLD}Webhawk Scan{RESET}  {DIM}{}{RESET}\n", report.source));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!(
        "Log type: {}  Encoding: {}  Records: {} read, {} dropped, {} clustered\n",
        report.log_type, report.encoding, report.records_read, report.records_dropped, report.dataset_size
    ));
    if let [pc1, pc2, ..] = report.explained_variance_ratio.as_slice() {
        out.push_str(&format!(
            "Explained variance: pc_1 {:.1}%  pc_2 {:.1}%\n",
            pc1 * 100.0,
            pc2 * 100.0
        ));
    }
    out.push('\n');

    // Clustering
    out.push_str(&format!("{BOLD}CLUSTERING{RESET}\n"));
    let eps = &report.epsilon;
    out.push_str(&format!(
        "  Epsilon: {}  (knee {}, selected {}{})\n",
        format_opt(eps.used),
        format_opt(eps.knee),
        format_opt(eps.selected),
        if eps.retried { ", retried at default radius" } else { "" }
    ));
    let clusters = report.clusters.iter().filter(|c| c.label != -1).count();
    out.push_str(&format!(
        "  Clusters: {}  Noise points: {}  Silhouette: {}\n",
        clusters,
        report.noise_count(),
        format_opt(report.silhouette)
    ));
    if !report.minority_clusters.is_empty() {
        let labels: Vec<String> = report.minority_clusters.iter().map(|l| l.to_string()).collect();
        out.push_str(&format!("  Minority clusters: {}\n", labels.join(", ")));
    }
    out.push('\n');

    if report.status == ScanStatus::Degenerate {
        out.push_str(&format!(
            "{DIM}All records fell into a single cluster, even at the default radius. Nothing stands out.{RESET}\n"
        ));
        return Ok(out);
    }

    // Findings summary
    let fs = &report.findings_summary;
    out.push_str(&format!("{BOLD}FINDINGS{RESET} ({} total)\n", fs.total));
    if fs.total == 0 {
        out.push_str(&format!("  {DIM}No anomalies detected.{RESET}\n"));
        return Ok(out);
    }
    out.push_str(&format!(
        "  \x1b[91m{} high{RESET} | \x1b[33m{} medium{RESET}\n\n",
        fs.high, fs.medium
    ));

    for severity in [Severity::High, Severity::Medium] {
        let bucket: Vec<&Finding> = report.findings.iter().filter(|f| f.severity == severity).collect();
        for finding in bucket.iter().take(MAX_LISTED) {
            out.push_str(&render_finding(finding));
        }
        let remaining = bucket.len().saturating_sub(MAX_LISTED);
        if remaining > 0 {
            out.push_str(&format!(
                "  {DIM}...and {} more {} findings (use --format json for all){RESET}\n",
                remaining, severity
            ));
        }
    }
    out.push('\n');

    Ok(out)
}

fn render_finding(finding: &Finding) -> String {
    let sev_c = severity_color(&finding.severity);
    let sev_tag = severity_tag(&finding.severity);

    // Truncate on chars, payloads are arbitrary text
    let payload: String = finding.payload.chars().take(100).collect();
    let payload = if finding.payload.chars().count() > 100 {
        format!("{}...", payload)
    } else {
        payload
    };

    let mut line = format!(
        "  {sev_c}{}{RESET} {:<12} {DIM}cluster {:>3}{RESET}  {}\n",
        sev_tag,
        finding.key.to_string(),
        finding.cluster,
        payload
    );
    if !finding.process_details.is_empty() {
        let details: Vec<String> = finding
            .process_details
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        line.push_str(&format!("      {DIM}{}{RESET}\n", details.join("  ")));
    }
    line
}

fn format_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_report;

    #[test]
    fn test_text_lists_findings_by_severity() {
        let out = render(&test_report()).unwrap();
        assert!(out.contains("Webhawk Scan"));
        assert!(out.contains("2 total"));
        assert!(out.contains("line 8"));
        assert!(out.contains("pid 4242"));
        assert!(out.contains("name=nginx"));
        assert!(out.find("[H]").unwrap() < out.find("[M]").unwrap());
    }

    #[test]
    fn test_text_degenerate_run() {
        let mut report = test_report();
        report.status = ScanStatus::Degenerate;
        report.findings.clear();
        report.findings_summary = Default::default();
        let out = render(&report).unwrap();
        assert!(out.contains("single cluster"));
        assert!(!out.contains("FINDINGS"));
    }

    #[test]
    fn test_long_payload_is_truncated() {
        let mut report = test_report();
        report.findings[0].payload = "é".repeat(300);
        let out = render(&report).unwrap();
        assert!(out.contains(&format!("{}...", "é".repeat(100))));
    }
}
