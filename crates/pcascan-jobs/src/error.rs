//! Error types for job services

use crate::status::JobKind;
use pcascan_eval::EvalError;
use pcascan_extractor::ExtractorError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while starting or running a job
#[derive(Error, Debug)]
pub enum JobError {
    /// A job of this kind is already running
    #[error("A {0} job is already running")]
    Busy(JobKind),

    /// A required input does not exist
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A project directory lacks a required file
    #[error("Project '{project}' has no {missing}")]
    IncompleteProject {
        /// Project identifier
        project: String,
        /// Description of the missing file
        missing: &'static str,
    },

    /// Project identifier is not a plain directory name
    #[error("Invalid project id: {0}")]
    InvalidProject(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The job was cancelled
    #[error("cancelled")]
    Cancelled,

    /// Extraction failed
    #[error(transparent)]
    Extractor(#[from] ExtractorError),

    /// Evaluation failed
    #[error(transparent)]
    Eval(#[from] EvalError),

    /// Background task failed to complete
    #[error("Worker error: {0}")]
    Worker(String),
}

impl JobError {
    /// Whether the error records a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Extractor(ExtractorError::Cancelled)
        )
    }
}
