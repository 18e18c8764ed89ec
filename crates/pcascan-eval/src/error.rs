//! Error types for evaluation

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while evaluating an experiment
#[derive(Error, Debug)]
pub enum EvalError {
    /// A required input file or directory does not exist
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A required CSV column is absent
    #[error("Column '{column}' missing from {}", .file.display())]
    MissingColumn {
        /// Expected header
        column: String,
        /// File that was read
        file: PathBuf,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// CSV read or write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
