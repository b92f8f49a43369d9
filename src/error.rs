//! Error types for nmap-inspect.
//!
//! Uses `thiserror` for ergonomic error definitions.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to read or interpret one scan document.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML in {path}: {reason}")]
    Xml { path: PathBuf, reason: String },

    #[error("{path} has no root element")]
    Empty { path: PathBuf },

    #[error("invalid port id '{value}' in {path}")]
    InvalidPort { path: PathBuf, value: String },
}

impl ParseError {
    /// The document the error refers to.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Read { path, .. }
            | Self::Xml { path, .. }
            | Self::Empty { path }
            | Self::InvalidPort { path, .. } => path,
        }
    }
}

/// Settings file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid config format: {0}")]
    InvalidFormat(String),
}

/// Rendering and export errors.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Top-level error for an inspection run.
#[derive(Error, Debug)]
pub enum InspectError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("failed to list {path}: {source}")]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for document parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for report output.
pub type ReportResult<T> = Result<T, ReportError>;

/// Result type alias for a whole inspection run.
pub type InspectResult<T> = Result<T, InspectError>;
