//! Trait definitions for external interactions
//!
//! The pipeline never talks to a model backend directly. It submits prompts
//! through [`ModelGateway`], which infrastructure crates implement.

/// Parameters sent with every model call
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams {
    /// Backend model name
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// API key, when the backend needs one
    pub api_key: Option<String>,
}

impl ModelParams {
    /// Create parameters without an API key
    pub fn new(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            temperature,
            api_key: None,
        }
    }

    /// Attach an API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Black-box "submit prompt, receive text" capability
///
/// Implemented by the infrastructure layer (pcascan-llm). Calls are
/// blocking; async callers run them on a blocking thread.
pub trait ModelGateway: Send + Sync {
    /// Error type for gateway operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Submit a prompt and return the raw reply text
    fn submit(&self, prompt: &str, params: &ModelParams) -> Result<String, Self::Error>;
}
