//! Error types for conversion runs.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the collaborators around the text engine.
///
/// The engine itself never fails on ambiguous input; everything here comes
/// from reading the source, writing the package, or loading configuration.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("failed to extract text from {path:?}: {message}")]
    Extraction { path: PathBuf, message: String },

    #[error("no extractable text in {0:?} (scanned document?)")]
    EmptyDocument(PathBuf),

    #[error("failed to write package to {path:?}: {source}")]
    Packaging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
