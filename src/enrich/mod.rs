//! Process enrichment
//!
//! Attaches live details of a process (name, parent, owner, command line,
//! ...) to findings that come from a process snapshot. The details are read
//! from the proc filesystem; a process that has exited or cannot be read
//! simply gets no details.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Attributes collected when the configuration does not name any
pub const DEFAULT_ATTRIBUTES: &[&str] = &[
    "name", "status", "ppid", "uid", "threads", "rss_kb", "cmdline", "exe",
];

/// Source of live process details
pub trait ProcessInspector: Send + Sync {
    /// Requested attributes of `pid`. Unknown attributes are ignored and an
    /// unreadable process yields an empty map.
    fn details(&self, pid: u32, attributes: &[String]) -> BTreeMap<String, String>;
}

/// Inspector that never finds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullInspector;

impl ProcessInspector for NullInspector {
    fn details(&self, _pid: u32, _attributes: &[String]) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// Reads `<root>/<pid>/status`, `cmdline` and `exe`
#[derive(Debug, Clone)]
pub struct ProcFsInspector {
    root: PathBuf,
}

impl Default for ProcFsInspector {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl ProcFsInspector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_all(&self, pid: u32) -> io::Result<BTreeMap<String, String>> {
        let dir = self.root.join(pid.to_string());
        let status = fs::read_to_string(dir.join("status"))?;
        let mut details = parse_status(&status);

        let cmdline = fs::read(dir.join("cmdline"))?;
        let args: Vec<String> = cmdline
            .split(|b| *b == 0)
            .filter(|arg| !arg.is_empty())
            .map(|arg| String::from_utf8_lossy(arg).into_owned())
            .collect();
        details.insert("cmdline".to_string(), args.join(" "));

        // The exe link of another user's process is usually unreadable
        match read_exe(&dir) {
            Ok(exe) => {
                details.insert("exe".to_string(), exe);
            }
            Err(e) => debug!("No exe for pid {}: {}", pid, e),
        }

        Ok(details)
    }
}

impl ProcessInspector for ProcFsInspector {
    fn details(&self, pid: u32, attributes: &[String]) -> BTreeMap<String, String> {
        match self.read_all(pid) {
            Ok(mut all) => attributes
                .iter()
                .filter_map(|attr| all.remove_entry(attr.as_str()))
                .collect(),
            Err(e) => {
                warn!("Could not inspect process {}: {}", pid, e);
                BTreeMap::new()
            }
        }
    }
}

fn read_exe(dir: &Path) -> io::Result<String> {
    Ok(fs::read_link(dir.join("exe"))?.display().to_string())
}

/// Pick the interesting keys out of a `status` file
fn parse_status(text: &str) -> BTreeMap<String, String> {
    let mut details = BTreeMap::new();
    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        let (name, value) = match key {
            "Name" => ("name", value.to_string()),
            "State" => ("status", value.to_string()),
            "PPid" => ("ppid", value.to_string()),
            // real, effective, saved, fs: keep the real uid
            "Uid" => ("uid", value.split_whitespace().next().unwrap_or_default().to_string()),
            "Threads" => ("threads", value.to_string()),
            "VmRSS" => ("rss_kb", value.trim_end_matches("kB").trim().to_string()),
            _ => continue,
        };
        details.insert(name.to_string(), value);
    }
    details
}
