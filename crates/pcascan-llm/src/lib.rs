//! pcascan Model Gateway Layer
//!
//! Implementations of the [`ModelGateway`](pcascan_domain::ModelGateway)
//! trait from `pcascan-domain`.
//!
//! # Gateways
//!
//! - [`MockGateway`]: scripted, deterministic replies for tests and dry runs
//! - [`GeminiGateway`]: Google Generative Language `generateContent` API
//!
//! # Examples
//!
//! ```
//! use pcascan_domain::{ModelGateway, ModelParams};
//! use pcascan_llm::MockGateway;
//!
//! let gateway = MockGateway::new(r#"{"rows": []}"#);
//! let params = ModelParams::new("mock", 0.0);
//! assert_eq!(gateway.submit("any prompt", &params).unwrap(), r#"{"rows": []}"#);
//! ```

#![warn(missing_docs)]

pub mod gemini;
pub mod mock;

use thiserror::Error;

pub use gemini::GeminiGateway;
pub use mock::MockGateway;

/// Errors that can occur while calling a model backend
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The backend rejected the credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// No API key was supplied for a backend that needs one
    #[error("Missing API key")]
    MissingApiKey,

    /// Invalid response from the backend
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}
