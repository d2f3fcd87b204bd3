use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("dataset card list could not be loaded from {path}: {message}")]
    #[diagnostic(help("check --data-dir / --base-url and that the card list is published"))]
    DatasetNotLoadable { path: String, message: String },

    #[error("malformed source {path}: {message}")]
    MalformedSource { path: String, message: String },

    #[error("source unavailable {path}: {message}")]
    SourceUnavailable { path: String, message: String },

    #[error("dataset not found in static card lists: {0}")]
    #[diagnostic(help("run `gml-catalog list` to see the available dataset titles"))]
    DatasetNotFound(String),

    #[error("resolution cancelled")]
    Cancelled,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("invalid filter value: {0}")]
    InvalidFilter(String),
}

impl CatalogError {
    /// Whether presentation should surface this error. A superseded
    /// resolution is dropped silently.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CatalogError::Cancelled)
    }
}
