//! Webhawk - unsupervised anomaly detection for logs
//!
//! Turns web access-log lines or OS process snapshots into feature
//! vectors, projects them to 2-D with PCA, clusters the projection with
//! DBSCAN and reports noise points (high severity) and members of small
//! clusters (medium severity).

pub mod classifier;
pub mod cli;
pub mod clustering;
pub mod config;
pub mod embedding;
pub mod encoding;
pub mod enrich;
pub mod error;
pub mod models;
pub mod parsers;
pub mod pipeline;
pub mod reporters;

pub use error::{Result, WebhawkError};
pub use pipeline::{Pipeline, ScanOutput};
