//! Record sources
//!
//! Turns raw input files into structured records: access-log lines
//! (apache, nginx or a custom regex) and `top`-style process snapshots.

mod access_log;
mod process_table;

pub use access_log::{AccessLogFormat, APACHE_PATTERN, NGINX_PATTERN, REQUIRED_GROUPS};
pub use process_table::parse_process_table;

use std::path::Path;
use tracing::info;

use crate::config::RunConfig;
use crate::error::{Result, WebhawkError};
use crate::models::{HttpRecord, ProcessRecord};

/// Supported input kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogType {
    Apache,
    Nginx,
    OsProcesses,
    /// Access log described by `[formats] custom` in webhawk.toml
    Custom,
}

impl LogType {
    pub const ALL: &'static [LogType] = &[
        LogType::Apache,
        LogType::Nginx,
        LogType::OsProcesses,
        LogType::Custom,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LogType::Apache => "apache",
            LogType::Nginx => "nginx",
            LogType::OsProcesses => "os_processes",
            LogType::Custom => "custom",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    pub fn is_access_log(&self) -> bool {
        !matches!(self, LogType::OsProcesses)
    }

    pub fn builtin_pattern(&self) -> Option<&'static str> {
        match self {
            LogType::Apache => Some(APACHE_PATTERN),
            LogType::Nginx => Some(NGINX_PATTERN),
            LogType::OsProcesses | LogType::Custom => None,
        }
    }
}

impl std::fmt::Display for LogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Records read from one input, in file order
#[derive(Debug, Clone)]
pub enum ParsedInput {
    Http(Vec<HttpRecord>),
    Processes {
        records: Vec<ProcessRecord>,
        /// Malformed or superseded rows
        skipped: usize,
    },
}

impl ParsedInput {
    pub fn len(&self) -> usize {
        match self {
            ParsedInput::Http(records) => records.len(),
            ParsedInput::Processes { records, .. } => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read and parse a file
pub fn parse_file(path: &Path, log_type: LogType, config: &RunConfig) -> Result<ParsedInput> {
    let text = std::fs::read_to_string(path)?;
    let parsed = parse_str(&text, log_type, config)?;
    info!("Read {} {} records from {}", parsed.len(), log_type, path.display());
    Ok(parsed)
}

/// Parse already loaded text
pub fn parse_str(text: &str, log_type: LogType, config: &RunConfig) -> Result<ParsedInput> {
    if log_type.is_access_log() {
        let format = config.access_log_format(log_type)?;
        Ok(ParsedInput::Http(format.parse(text, &config.special_chars)?))
    } else {
        if !text.trim().is_empty() && !text.lines().any(process_table::is_header) {
            return Err(WebhawkError::Format {
                line: 0,
                log_type: log_type.name().to_string(),
            });
        }
        let (records, skipped) = parse_process_table(text);
        Ok(ParsedInput::Processes { records, skipped })
    }
}
