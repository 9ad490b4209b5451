//! End-to-end tests of the detection pipeline through the library API

use webhawk::clustering::{silhouette_score, Dbscan, NOISE};
use webhawk::config::RunConfig;
use webhawk::enrich::NullInspector;
use webhawk::models::{RecordKey, ScanStatus, Severity};
use webhawk::parsers::LogType;
use webhawk::{Pipeline, WebhawkError};

fn pipeline(config: RunConfig) -> Pipeline {
    Pipeline::new(RunConfig { enrich: false, ..config }).with_inspector(NullInspector)
}

fn access_line(ip: &str, request: &str, status: &str, agent: &str) -> String {
    format!(
        r#"{} - - [10/Oct/2024:13:55:36 +0000] "{}" {} 1024 "-" "{}""#,
        ip, request, status, agent
    )
}

/// 40 browser hits, 3 identical scanner hits and one lone injection attempt
fn traffic() -> String {
    let mut lines = Vec::new();
    for _ in 0..40 {
        lines.push(access_line("192.168.1.10", "GET /shop/index.html HTTP/1.1", "200", "Mozilla/5.0"));
    }
    for _ in 0..3 {
        lines.push(access_line("45.12.1.9", "GET /wp-admin/setup-config.php HTTP/1.1", "404", "zgrab/0.x"));
    }
    lines.push(access_line(
        "6.6.6.6",
        "GET /shop/item.php?id=1%27%20UNION%20SELECT%20password%20FROM%20users--&debug=1&x=2 HTTP/1.1",
        "500",
        "sqlmap/1.7",
    ));
    lines.join("\n")
}

/// Browsing sessions over distinct shop pages
const SHOP_HITS: &[(&str, &str)] = &[
    ("192.168.1.11", "/shop/checkout"),
    ("192.168.1.11", "/shop/product/help/account?page=596"),
    ("192.168.1.13", "/shop/review/order?page=558"),
    ("192.168.1.12", "/shop/product/catalog/order"),
    ("192.168.1.11", "/shop/review/order"),
    ("192.168.1.12", "/shop/account"),
    ("192.168.1.14", "/shop/basket?page=369"),
    ("192.168.1.14", "/shop/order/basket/gift?page=753"),
    ("192.168.1.13", "/shop/help/search"),
    ("192.168.1.14", "/shop/review?page=473"),
    ("192.168.1.13", "/shop/gift"),
    ("192.168.1.12", "/shop/order/search/gift?page=473"),
    ("192.168.1.12", "/shop/order/gift/help?page=964"),
    ("192.168.1.14", "/shop/basket/product/gift"),
    ("192.168.1.11", "/shop/order/help/review"),
    ("192.168.1.10", "/shop/order/search?page=639"),
    ("192.168.1.10", "/shop/catalog/account?page=109"),
    ("192.168.1.10", "/shop/catalog/product/account?page=938"),
    ("192.168.1.10", "/shop/basket/product/account?page=967"),
    ("192.168.1.11", "/shop/catalog/help"),
    ("192.168.1.10", "/shop/catalog"),
    ("192.168.1.12", "/shop/catalog?page=22"),
    ("192.168.1.10", "/shop/basket/help?page=536"),
    ("192.168.1.11", "/shop/help/catalog?page=254"),
    ("192.168.1.14", "/shop/catalog"),
    ("192.168.1.12", "/shop/checkout/product/search"),
    ("192.168.1.13", "/shop/order/catalog?page=774"),
    ("192.168.1.12", "/shop/basket/gift/account"),
    ("192.168.1.11", "/shop/catalog"),
    ("192.168.1.12", "/shop/help/review/gift?page=148"),
];

/// 30 distinct shop requests, 3 WordPress scans (lines 30-32) and one
/// injection attempt (line 33); no two records encode to the same vector
fn shop_traffic() -> String {
    let mut lines: Vec<String> = SHOP_HITS
        .iter()
        .map(|(ip, path)| access_line(ip, &format!("GET {} HTTP/1.1", path), "200", "Mozilla/5.0"))
        .collect();
    for path in ["/wp-admin/setup-config.php", "/wp-admin/install.php", "/wp-admin/upgrade.php"] {
        lines.push(access_line("45.12.1.9", &format!("GET {} HTTP/1.1", path), "404", "zgrab/0.x"));
    }
    lines.push(access_line(
        "6.6.6.6",
        "GET /shop/item.php?id=1%27%20UNION%20SELECT%20password%20FROM%20users--&debug=1&x=2 HTTP/1.1",
        "500",
        "sqlmap/1.7",
    ));
    lines.join("\n")
}

fn lines_with(report: &webhawk::models::ScanReport, severity: Severity) -> Vec<RecordKey> {
    report
        .findings
        .iter()
        .filter(|f| f.severity == severity)
        .map(|f| f.key)
        .collect()
}

#[test]
fn test_noise_and_minority_cluster_from_access_log() {
    let output = pipeline(RunConfig { eps: Some(0.5), ..RunConfig::default() })
        .scan_str(&traffic(), LogType::Apache, "traffic.log")
        .unwrap();
    let report = &output.report;

    assert_eq!(report.status, ScanStatus::Clustered);
    assert_eq!(report.dataset_size, 44);
    assert_eq!(report.noise_count(), 1);

    let high: Vec<_> = report.findings.iter().filter(|f| f.severity == Severity::High).collect();
    let medium: Vec<_> = report.findings.iter().filter(|f| f.severity == Severity::Medium).collect();
    assert_eq!(high.len(), 1);
    assert_eq!(high[0].key, RecordKey::Line(43));
    assert_eq!(high[0].cluster, NOISE);
    assert_eq!(medium.len(), 3);
    assert_eq!(
        medium.iter().map(|f| f.index).collect::<Vec<_>>(),
        vec![40, 41, 42]
    );
    // high bucket first
    assert_eq!(report.findings[0].severity, Severity::High);
    assert_eq!(report.findings_summary.total, 4);
    assert_eq!(report.minority_clusters.len(), 1);
}

#[test]
fn test_invalid_status_codes_are_dropped() {
    let mut text = traffic();
    text.push('\n');
    text.push_str(&access_line("10.9.9.9", "GET / HTTP/1.1", "-", "curl/8.0"));
    text.push('\n');
    text.push_str(&access_line("10.9.9.9", "GET / HTTP/1.1", "0", "curl/8.0"));

    let output = pipeline(RunConfig { eps: Some(0.5), ..RunConfig::default() })
        .scan_str(&text, LogType::Apache, "traffic.log")
        .unwrap();
    assert_eq!(output.report.records_read, 46);
    assert_eq!(output.report.records_dropped, 2);
    assert_eq!(output.report.dataset_size, 44);
}

#[test]
fn test_record_cap_keeps_the_first_records() {
    let output = pipeline(RunConfig {
        eps: Some(0.5),
        max_records: 30,
        ..RunConfig::default()
    })
    .scan_str(&traffic(), LogType::Apache, "traffic.log")
    .unwrap();
    assert_eq!(output.report.dataset_size, 30);
    assert_eq!(output.report.records_dropped, 14);
    // only identical browser hits remain
    assert_eq!(output.report.status, ScanStatus::Degenerate);
    assert!(output.report.findings.is_empty());
}

#[test]
fn test_label_encoding_gives_the_same_findings_here() {
    use webhawk::encoding::CategoricalEncoding;

    let output = pipeline(RunConfig {
        eps: Some(0.5),
        encoding: CategoricalEncoding::Label,
        ..RunConfig::default()
    })
    .scan_str(&traffic(), LogType::Apache, "traffic.log")
    .unwrap();
    assert_eq!(output.report.encoding, "label_encoding");
    assert_eq!(output.report.findings_summary.high, 1);
    assert_eq!(output.report.findings_summary.medium, 3);
}

#[test]
fn test_process_snapshot_findings_keyed_by_pid() {
    let mut table = String::from("Processes: 23 total\n  PID COMMAND   %CPU   TIME  POWER\n");
    for pid in 200..220 {
        table.push_str(&format!("  {} launchd    0.0   1.00    0.0\n", pid));
    }
    table.push_str("  777 miner     98.7   512.00 88.1\n");
    table.push_str("Load Avg: 1.20, 1.10, 1.00\n");

    let output = pipeline(RunConfig { eps: Some(0.5), ..RunConfig::default() })
        .scan_str(&table, LogType::OsProcesses, "top.txt")
        .unwrap();
    let report = &output.report;
    assert_eq!(report.features, vec!["%CPU", "TIME", "POWER"]);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].key, RecordKey::Pid(777));
    assert!(report.findings[0].payload.contains("POWER=88.1"));
    assert!(report.findings[0].process_details.is_empty());
}

#[test]
fn test_process_text_without_header_is_a_format_error() {
    let err = pipeline(RunConfig::default())
        .scan_str("just some text\nwithout a table\n", LogType::OsProcesses, "x.txt")
        .unwrap_err();
    assert!(matches!(err, WebhawkError::Format { .. }));
}

#[test]
fn test_single_record_is_not_enough() {
    let line = access_line("10.0.0.1", "GET / HTTP/1.1", "200", "curl/8.0");
    let err = pipeline(RunConfig { eps: Some(0.5), ..RunConfig::default() })
        .scan_str(&line, LogType::Apache, "one.log")
        .unwrap_err();
    assert!(matches!(err, WebhawkError::InsufficientData { .. }));
}

#[test]
fn test_knee_epsilon_on_access_log() {
    let output = pipeline(RunConfig::default())
        .scan_str(&shop_traffic(), LogType::Apache, "shop.log")
        .unwrap();
    let report = &output.report;

    let knee = report.epsilon.knee.expect("knee detected");
    assert!(knee > 0.0);
    assert_eq!(report.epsilon.selected, Some(knee));
    assert_eq!(report.epsilon.used, Some(knee));
    assert!(!report.epsilon.retried);

    assert_eq!(report.status, ScanStatus::Clustered);
    assert_eq!(lines_with(report, Severity::High), vec![RecordKey::Line(33)]);
    assert_eq!(
        lines_with(report, Severity::Medium),
        vec![RecordKey::Line(30), RecordKey::Line(31), RecordKey::Line(32)]
    );
    assert_eq!(report.clusters.len(), 3);
}

#[test]
fn test_repeated_lines_leave_no_usable_knee() {
    // 40 identical browser hits put the knee on the zero-distance plateau
    for optimize_silhouette in [false, true] {
        let err = pipeline(RunConfig {
            optimize_silhouette,
            ..RunConfig::default()
        })
        .scan_str(&traffic(), LogType::Apache, "traffic.log")
        .unwrap_err();
        assert!(matches!(err, WebhawkError::KneeNotFound { points: 44 }), "{:?}", err);
    }
}

#[test]
fn test_standardized_scan_on_access_log() {
    let output = pipeline(RunConfig {
        standardize: true,
        ..RunConfig::default()
    })
    .scan_str(&shop_traffic(), LogType::Apache, "shop.log")
    .unwrap();
    let report = &output.report;

    assert_eq!(report.status, ScanStatus::Clustered);
    assert!(report.epsilon.knee.is_some_and(|k| k > 0.0));
    assert_eq!(lines_with(report, Severity::High), vec![RecordKey::Line(33)]);
    // unit variance puts every feature on equal footing: smaller shop
    // clusters now fall under the threshold next to the scanner
    let medium = lines_with(report, Severity::Medium);
    for line in 30..33 {
        assert!(medium.contains(&RecordKey::Line(line)));
    }
    assert_eq!(medium.len(), 15);
    assert_eq!(report.minority_clusters.len(), 3);
}

#[test]
fn test_silhouette_sweep_refines_standardized_scan() {
    let output = pipeline(RunConfig {
        standardize: true,
        optimize_silhouette: true,
        ..RunConfig::default()
    })
    .scan_str(&shop_traffic(), LogType::Apache, "shop.log")
    .unwrap();
    let report = &output.report;
    let config = RunConfig::default();

    let knee = report.epsilon.knee.expect("knee detected");
    let selected = report.epsilon.selected.unwrap();
    assert!(selected > knee);
    assert!(selected <= config.sweep_ceiling * knee + 1e-12);
    assert_eq!(report.epsilon.used, Some(selected));

    let points = output.embedding.points();
    let at_knee = silhouette_score(points, &Dbscan::new(knee, config.min_samples).fit(points)).unwrap();
    assert!(report.silhouette.unwrap() >= at_knee);

    // the wider radius merges the shop traffic back into one cluster
    assert_eq!(lines_with(report, Severity::High), vec![RecordKey::Line(33)]);
    assert_eq!(
        lines_with(report, Severity::Medium),
        vec![RecordKey::Line(30), RecordKey::Line(31), RecordKey::Line(32)]
    );
}
