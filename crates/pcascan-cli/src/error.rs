//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Model backend error
    #[error("Model backend error: {0}")]
    Llm(#[from] pcascan_llm::LlmError),

    /// Extraction setup error
    #[error(transparent)]
    Extractor(#[from] pcascan_extractor::ExtractorError),

    /// Evaluation error
    #[error(transparent)]
    Eval(#[from] pcascan_eval::EvalError),

    /// Job service error
    #[error(transparent)]
    Job(#[from] pcascan_jobs::JobError),

    /// A job ended in the error state
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// No API key was supplied for the model backend
    #[error("No API key. Set GOOGLE_API_KEY or pass --api-key.")]
    MissingApiKey,
}
