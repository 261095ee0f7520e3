//! Error types for graph building

use thiserror::Error;

/// Result type for setup and I/O operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a run before any output is produced
#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing setting: {0}")]
    MissingSetting(&'static str),

    #[error("Unknown embedded taxonomy: {0}")]
    UnknownTaxonomy(String),

    #[error("Invalid taxonomy: {0}")]
    InvalidTaxonomy(String),

    #[error("Invalid record input: {0}")]
    InvalidRecords(String),

    #[error("Zotero API returned {status}: {body}")]
    ZoteroStatus { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
