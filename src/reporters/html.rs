//! HTML reporter with embedded styles
//!
//! Generates a standalone HTML report that can be viewed in any browser.
//! Includes:
//! - Run metadata and clustering parameters
//! - Cluster populations
//! - A findings table, colour-coded by severity

use crate::models::{Finding, ScanReport, ScanStatus, Severity};
use anyhow::Result;

/// Render report as standalone HTML
pub fn render(report: &ScanReport) -> Result<String> {
    let mut html = String::new();

    html.push_str(&render_head(report));
    html.push_str("<body>\n<div class=\"container\">\n");
    html.push_str(&render_header(report));

    html.push_str("<div class=\"content\">\n");
    html.push_str(&render_metrics(report));
    html.push_str(&render_clusters(report));
    html.push_str(&render_findings(report));
    html.push_str("</div>\n"); // content

    html.push_str(&render_footer(report));
    html.push_str("</div>\n</body>\n</html>");

    Ok(html)
}

fn render_head(report: &ScanReport) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Webhawk Scan - {}</title>
    <style>
{CSS}
    </style>
</head>
"#,
        html_escape(&report.source)
    )
}

fn render_header(report: &ScanReport) -> String {
    format!(
        r#"<div class="header">
    <h1>Webhawk Scan Report</h1>
    <p class="source">{} ({})</p>
    <p class="timestamp">Generated {}</p>
</div>
"#,
        html_escape(&report.source),
        html_escape(&report.log_type),
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

fn render_metrics(report: &ScanReport) -> String {
    let fs = &report.findings_summary;
    format!(
        r#"<div class="section">
    <h2 class="section-title">Run</h2>
    <div class="stats-grid">
        <div class="stat-item">
            <div class="stat-value">{}</div>
            <div class="stat-label">Records clustered</div>
        </div>
        <div class="stat-item">
            <div class="stat-value">{}</div>
            <div class="stat-label">Dropped</div>
        </div>
        <div class="stat-item">
            <div class="stat-value">{}</div>
            <div class="stat-label">Epsilon</div>
        </div>
        <div class="stat-item">
            <div class="stat-value">{}</div>
            <div class="stat-label">Silhouette</div>
        </div>
        <div class="stat-item severity-high-border">
            <div class="stat-value">{}</div>
            <div class="stat-label">High</div>
        </div>
        <div class="stat-item severity-medium-border">
            <div class="stat-value">{}</div>
            <div class="stat-label">Medium</div>
        </div>
    </div>
    <p class="meta">Encoding: {} &middot; Features: {}{}</p>
</div>
"#,
        report.dataset_size,
        report.records_dropped,
        format_opt(report.epsilon.used),
        format_opt(report.silhouette),
        fs.high,
        fs.medium,
        html_escape(&report.encoding),
        html_escape(&report.features.join(", ")),
        if report.epsilon.retried {
            " &middot; retried at the default radius"
        } else {
            ""
        }
    )
}

fn render_clusters(report: &ScanReport) -> String {
    let rows: Vec<String> = report
        .clusters
        .iter()
        .map(|c| {
            let kind = if c.label == -1 {
                "noise"
            } else if report.minority_clusters.contains(&c.label) {
                "minority"
            } else {
                ""
            };
            format!(
                "            <tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                c.label, c.count, kind
            )
        })
        .collect();

    format!(
        r#"<div class="section">
    <h2 class="section-title">Clusters</h2>
    <table>
        <thead><tr><th>Label</th><th>Points</th><th></th></tr></thead>
        <tbody>
{}
        </tbody>
    </table>
</div>
"#,
        rows.join("\n")
    )
}

fn render_findings(report: &ScanReport) -> String {
    if report.status == ScanStatus::Degenerate {
        return r#"<div class="section">
    <h2 class="section-title">No Findings</h2>
    <p>All records fell into a single cluster, even at the default radius.</p>
</div>
"#
        .to_string();
    }
    if report.findings.is_empty() {
        return r#"<div class="section">
    <h2 class="section-title">No Findings</h2>
    <p>No noise points and no minority clusters.</p>
</div>
"#
        .to_string();
    }

    let mut html = format!(
        r#"<div class="section">
    <h2 class="section-title">Findings ({} total)</h2>
    <table class="findings">
        <thead><tr><th>Severity</th><th>Record</th><th>Cluster</th><th>Payload</th></tr></thead>
        <tbody>
"#,
        report.findings.len()
    );

    for finding in &report.findings {
        html.push_str(&render_finding(finding));
    }

    html.push_str("        </tbody>\n    </table>\n</div>\n");
    html
}

fn render_finding(finding: &Finding) -> String {
    let (sev_class, sev_label) = match finding.severity {
        Severity::High => ("severity-high", "High"),
        Severity::Medium => ("severity-medium", "Medium"),
    };

    let details = if finding.process_details.is_empty() {
        String::new()
    } else {
        let items: Vec<String> = finding
            .process_details
            .iter()
            .map(|(k, v)| format!("<span class=\"detail\">{}={}</span>", html_escape(k), html_escape(v)))
            .collect();
        format!("<div class=\"details\">{}</div>", items.join(" "))
    };

    format!(
        r#"            <tr>
                <td><span class="severity-badge {}">{}</span></td>
                <td class="key">{}</td>
                <td>{}</td>
                <td><code>{}</code>{}</td>
            </tr>
"#,
        sev_class,
        sev_label,
        finding.key,
        finding.cluster,
        html_escape(&finding.payload),
        details
    )
}

fn render_footer(report: &ScanReport) -> String {
    format!(
        r#"<div class="footer">
    <p>Generated by Webhawk &middot; run {}</p>
</div>
"#,
        html_escape(&report.run_id)
    )
}

fn format_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "-".to_string())
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// Embedded CSS
const CSS: &str = r#"
:root {
    --primary-color: #0f766e;
    --background-color: #f8fafc;
    --text-color: #1e293b;
    --card-background: white;
    --border-color: #e2e8f0;
}

* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    line-height: 1.6;
    color: var(--text-color);
    background: var(--background-color);
    padding: 2rem;
}

.container {
    max-width: 1200px;
    margin: 0 auto;
    background: var(--card-background);
    border-radius: 12px;
    box-shadow: 0 4px 6px -1px rgba(0,0,0,0.1);
    overflow: hidden;
}

.header {
    background: linear-gradient(135deg, #0f766e 0%, #334155 100%);
    color: white;
    padding: 2.5rem 2rem;
    text-align: center;
}

.header h1 { font-size: 2.25rem; margin-bottom: 0.5rem; }
.header .source { font-family: monospace; }
.header .timestamp { opacity: 0.9; font-size: 0.95rem; }

.content { padding: 2rem; }

.section { margin-bottom: 2rem; }
.section-title {
    font-size: 1.5rem;
    margin-bottom: 1rem;
    padding-bottom: 0.5rem;
    border-bottom: 2px solid var(--border-color);
}

.stats-grid {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(150px, 1fr));
    gap: 1rem;
}

.stat-item {
    background: var(--card-background);
    border: 1px solid var(--border-color);
    border-radius: 8px;
    padding: 1.25rem;
    text-align: center;
}

.stat-value { font-size: 1.75rem; font-weight: bold; }
.stat-label { font-size: 0.875rem; color: #64748b; }
.severity-high-border { border-top: 4px solid #dc2626; }
.severity-medium-border { border-top: 4px solid #ca8a04; }

.meta { margin-top: 1rem; color: #64748b; font-size: 0.875rem; }

table { width: 100%; border-collapse: collapse; font-size: 0.9rem; }
th, td { text-align: left; padding: 0.5rem 0.75rem; border-bottom: 1px solid var(--border-color); vertical-align: top; }
th { background: #f1f5f9; font-weight: 600; }
td.key { white-space: nowrap; font-family: monospace; }
code { font-size: 0.85rem; word-break: break-all; }

.severity-badge {
    padding: 0.2rem 0.6rem;
    border-radius: 6px;
    font-size: 0.8rem;
    font-weight: 600;
    color: white;
    white-space: nowrap;
}

.severity-high { background: #dc2626; }
.severity-medium { background: #ca8a04; }

.details { margin-top: 0.25rem; }
.detail {
    display: inline-block;
    background: #e0f2f1;
    color: #0f766e;
    padding: 0.1rem 0.5rem;
    border-radius: 4px;
    font-size: 0.8rem;
    margin-right: 0.25rem;
}

.footer {
    text-align: center;
    padding: 2rem;
    color: #64748b;
    border-top: 1px solid var(--border-color);
}

@media (max-width: 768px) {
    body { padding: 1rem; }
    .header { padding: 2rem 1rem; }
    .header h1 { font-size: 1.75rem; }
}

@media print {
    body { padding: 0; background: white; }
    .container { box-shadow: none; }
    tr { page-break-inside: avoid; }
}
"#;
