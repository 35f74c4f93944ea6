//! Error types for the edges of the engine.
//!
//! Classification and aggregation never fail; these errors only come from
//! loading configuration and decoding ticket batches.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SlaError {
    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("decode tickets (line {line}): {source}")]
    TicketDecode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown source {0:?} (expected case-management, issue-tracker, itsm-change or itsm-incident)")]
    UnknownSource(String),
    #[error("invalid threshold key {key:?} for {family} catalog")]
    InvalidThresholdKey { family: &'static str, key: String },
}
