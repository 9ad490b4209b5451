//! `top`-style process snapshot parser
//!
//! Columns are fixed-width: each one spans from the start of its header
//! token to the start of the next, the last runs to the end of the line.
//! A summary line (`Processes: ...`, `Load Avg: ...`) closes the current
//! table; a new header opens the next one.

use regex::Regex;
use rustc_hash::FxHashMap;
use std::sync::OnceLock;
use tracing::debug;

use crate::models::{FieldValue, ProcessRecord};

static SUMMARY_LINE: OnceLock<Regex> = OnceLock::new();

pub fn is_header(line: &str) -> bool {
    line.contains("PID") && line.contains("%CPU")
}

fn is_summary(line: &str) -> bool {
    SUMMARY_LINE
        .get_or_init(|| Regex::new(r"^\D*:").expect("valid regex"))
        .is_match(line)
}

/// Column name with its char span in the line
#[derive(Debug, Clone)]
struct Column {
    name: String,
    start: usize,
    end: Option<usize>,
}

fn header_columns(line: &str) -> Vec<Column> {
    let mut starts = Vec::new();
    let mut in_token = false;
    for (i, c) in line.chars().enumerate() {
        if c.is_whitespace() {
            in_token = false;
        } else if !in_token {
            starts.push(i);
            in_token = true;
        }
    }

    let names: Vec<&str> = line.split_whitespace().collect();
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Column {
            name: name.to_string(),
            // the first column also takes any leading padding
            start: if i == 0 { 0 } else { starts[i] },
            end: starts.get(i + 1).copied(),
        })
        .collect()
}

fn cell(chars: &[char], col: &Column) -> String {
    let start = col.start.min(chars.len());
    let end = col.end.unwrap_or(chars.len()).min(chars.len()).max(start);
    chars[start..end].iter().collect::<String>().trim().to_string()
}

/// Parse every table in `text`.
///
/// Returns the rows in file order plus the number of rows skipped
/// (no valid PID, or superseded by a later row with the same PID).
pub fn parse_process_table(text: &str) -> (Vec<ProcessRecord>, usize) {
    let mut columns: Option<Vec<Column>> = None;
    let mut rows: Vec<ProcessRecord> = Vec::new();
    let mut skipped = 0;

    for (line_no, line) in text.lines().enumerate() {
        if is_summary(line) {
            columns = None;
        }
        if is_header(line) {
            columns = Some(header_columns(line));
            continue;
        }
        let Some(cols) = &columns else {
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }

        let chars: Vec<char> = line.chars().collect();
        let mut pid = None;
        let mut fields = Vec::with_capacity(cols.len());
        for col in cols {
            let raw = cell(&chars, col);
            if col.name == "PID" {
                pid = raw.parse::<u32>().ok();
            } else {
                fields.push((col.name.clone(), FieldValue::parse(&raw)));
            }
        }

        match pid {
            Some(pid) => rows.push(ProcessRecord {
                line: line_no,
                pid,
                fields,
            }),
            None => {
                debug!("Skipping process row without a valid PID at line {}", line_no + 1);
                skipped += 1;
            }
        }
    }

    // Last occurrence of a PID wins and stays where it was seen
    let mut last_seen: FxHashMap<u32, usize> = FxHashMap::default();
    for (i, row) in rows.iter().enumerate() {
        last_seen.insert(row.pid, i);
    }
    let total = rows.len();
    let records: Vec<ProcessRecord> = rows
        .into_iter()
        .enumerate()
        .filter(|(i, row)| last_seen.get(&row.pid) == Some(i))
        .map(|(_, row)| row)
        .collect();
    skipped += total - records.len();

    (records, skipped)
}
