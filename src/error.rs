//! Error types for this crate.
use std::path::PathBuf;

use thiserror::Error;

/// Any kind of error that can happen while building a report.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot read CSV file '{}': {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },
    #[error("malformed JSON in '{}' at line {line}: {error}", file.display())]
    Json {
        file: PathBuf,
        line: usize,
        error: serde_json::Error,
    },
    #[error("cannot list transaction folders under '{}': {source}", path.display())]
    Discovery {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("basket item field '{field}' conflicts with purchase metadata")]
    ConflictingField { field: String },
    #[error("table '{table}' has no column '{column}'")]
    MissingColumn { table: String, column: String },
    #[error("cannot interpret '{value}' as a purchase date")]
    InvalidDate { value: String },
}

pub type Result<T> = std::result::Result<T, Error>;
