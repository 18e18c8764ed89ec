//! Scripted gateway for tests
//!
//! Reply selection, first match wins:
//!
//! 1. the next entry of the FIFO script, if any remain
//! 2. the first registered reply whose key is a substring of the prompt
//! 3. the default reply
//!
//! Every prompt is recorded in a call log shared between clones, so a test
//! can hand one clone to the pipeline and inspect the other.

use crate::LlmError;
use pcascan_domain::{ModelGateway, ModelParams};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error(String),
}

impl MockReply {
    fn into_result(self) -> Result<String, LlmError> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Error(message) => Err(LlmError::Other(message)),
        }
    }
}

/// Mock model gateway for deterministic testing
///
/// # Examples
///
/// ```
/// use pcascan_domain::{ModelGateway, ModelParams};
/// use pcascan_llm::MockGateway;
///
/// let gateway = MockGateway::new("fallback");
/// gateway.add_response("Pages 1-2", r#"{"rows": []}"#);
/// gateway.push_reply("first call");
///
/// let params = ModelParams::new("mock", 0.0);
/// assert_eq!(gateway.submit("Pages 1-2", &params).unwrap(), "first call");
/// assert_eq!(gateway.submit("Pages 1-2", &params).unwrap(), r#"{"rows": []}"#);
/// assert_eq!(gateway.submit("other", &params).unwrap(), "fallback");
/// assert_eq!(gateway.call_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct MockGateway {
    default_response: String,
    responses: Arc<Mutex<Vec<(String, MockReply)>>>,
    script: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

impl MockGateway {
    /// Create a gateway with a fixed reply for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(Vec::new())),
            script: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Sleep for `delay` before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Reply with `response` to any prompt containing `key`
    pub fn add_response(&self, key: impl Into<String>, response: impl Into<String>) {
        lock(&self.responses).push((key.into(), MockReply::Text(response.into())));
    }

    /// Fail any prompt containing `key`
    pub fn add_error(&self, key: impl Into<String>, message: impl Into<String>) {
        lock(&self.responses).push((key.into(), MockReply::Error(message.into())));
    }

    /// Queue a reply for the next unscripted call
    pub fn push_reply(&self, response: impl Into<String>) {
        lock(&self.script).push_back(MockReply::Text(response.into()));
    }

    /// Queue a failure for the next unscripted call
    pub fn push_error(&self, message: impl Into<String>) {
        lock(&self.script).push_back(MockReply::Error(message.into()));
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Prompts received, in call order
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Clear the call log
    pub fn reset_calls(&self) {
        lock(&self.calls).clear();
    }

    fn select(&self, prompt: &str) -> MockReply {
        if let Some(reply) = lock(&self.script).pop_front() {
            return reply;
        }

        lock(&self.responses)
            .iter()
            .find(|(key, _)| prompt.contains(key.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| MockReply::Text(self.default_response.clone()))
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new(r#"{"rows": []}"#)
    }
}

impl ModelGateway for MockGateway {
    type Error = LlmError;

    fn submit(&self, prompt: &str, _params: &ModelParams) -> Result<String, Self::Error> {
        lock(&self.calls).push(prompt.to_string());

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        self.select(prompt).into_result()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
