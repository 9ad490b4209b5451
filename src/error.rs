//! Error types for the detection pipeline
//!
//! Fatal conditions abort the run. Recoverable ones (enrichment lookups,
//! degenerate clustering) never surface as an error value and are handled
//! where they occur.

use thiserror::Error;

/// Errors that abort a scan
#[derive(Error, Debug)]
pub enum WebhawkError {
    #[error("line {line}: record does not match the '{log_type}' log format")]
    Format { line: usize, log_type: String },

    #[error("cannot build categorical tables: {0}")]
    Encoding(String),

    #[error("no knee point found on the sorted nearest-neighbour distance curve ({points} points); pass --eps explicitly")]
    KneeNotFound { points: usize },

    #[error("not enough data: {what} requires at least {needed}, got {have}")]
    InsufficientData {
        what: &'static str,
        needed: usize,
        have: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WebhawkError>;
