//! Access-log parser
//!
//! Each format is a regex with the named groups listed in
//! [`REQUIRED_GROUPS`]. A non-blank line that does not match aborts the
//! whole run: a log in the wrong format produces meaningless features.

use regex::Regex;

use crate::encoding::{split_request, UrlMetrics};
use crate::error::{Result, WebhawkError};
use crate::models::HttpRecord;

/// Apache combined log format
pub const APACHE_PATTERN: &str = r#"^(?P<ip>\S+) \S+ \S+ \[[^\]]*\] "(?P<request>[^"]*)" (?P<status>\d+|-) (?P<size>\d+|-) "[^"]*" "(?P<user_agent>[^"]*)""#;

/// nginx `combined` log_format; trailing custom fields are tolerated
pub const NGINX_PATTERN: &str = r#"^(?P<ip>\S+) - \S+ \[[^\]]*\] "(?P<request>[^"]*)" (?P<status>\d+|-) (?P<size>\d+|-) "[^"]*" "(?P<user_agent>[^"]*)""#;

pub const REQUIRED_GROUPS: &[&str] = &["ip", "request", "status", "size", "user_agent"];

/// A compiled access-log format
#[derive(Debug, Clone)]
pub struct AccessLogFormat {
    log_type: String,
    regex: Regex,
}

impl AccessLogFormat {
    pub fn compile(log_type: &str, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            WebhawkError::InvalidConfig(format!("format '{}' is not a valid regex: {}", log_type, e))
        })?;

        let names: Vec<&str> = regex.capture_names().flatten().collect();
        let missing: Vec<&str> = REQUIRED_GROUPS
            .iter()
            .copied()
            .filter(|g| !names.contains(g))
            .collect();
        if !missing.is_empty() {
            return Err(WebhawkError::InvalidConfig(format!(
                "format '{}' lacks named groups: {}",
                log_type,
                missing.join(", ")
            )));
        }

        Ok(Self {
            log_type: log_type.to_string(),
            regex,
        })
    }

    pub fn log_type(&self) -> &str {
        &self.log_type
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Parse one line; `line` is its 0-based position in the file.
    pub fn parse_line(&self, line: usize, text: &str, special_chars: &str) -> Result<HttpRecord> {
        let caps = self.regex.captures(text).ok_or_else(|| WebhawkError::Format {
            line: line + 1,
            log_type: self.log_type.clone(),
        })?;
        let group = |name: &str| caps.name(name).map(|m| m.as_str()).unwrap_or_default();

        let (http_query, url) = split_request(group("request"));
        let metrics = UrlMetrics::measure(&url, special_chars);

        Ok(HttpRecord {
            line,
            raw: text.to_string(),
            ip: group("ip").to_string(),
            http_query,
            url,
            return_code: group("status").parse().ok(),
            size: group("size").parse().unwrap_or(0),
            user_agent: group("user_agent").to_string(),
            metrics,
        })
    }

    /// Parse a whole log. Blank lines are skipped.
    pub fn parse(&self, text: &str, special_chars: &str) -> Result<Vec<HttpRecord>> {
        text.lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .map(|(i, l)| self.parse_line(i, l, special_chars))
            .collect()
    }
}
