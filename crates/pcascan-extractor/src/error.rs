//! Error types for the extraction pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Model gateway failure (transport, auth, quota)
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// A required input file or directory does not exist
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Input was present but unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The job was cancelled
    #[error("Extraction cancelled")]
    Cancelled,

    /// Filesystem error while writing artifacts
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A blocking gateway task panicked or was aborted
    #[error("Task join error: {0}")]
    Join(String),
}
