//! Recover JSON from model replies
//!
//! Models asked for strict JSON still wrap it in markdown fences, prefix it
//! with chatter, or append commentary. [`JsonRecoveryParser`] runs an
//! ordered list of [`RecoveryStrategy`] values and returns the first
//! successful parse.

use serde_json::Value;
use tracing::debug;

/// One way of pulling a JSON value out of raw model text
pub trait RecoveryStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Attempt to recover a JSON value from `raw`
    fn recover(&self, raw: &str) -> Option<Value>;
}

/// Parse the whole reply as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictJson;

impl RecoveryStrategy for StrictJson {
    fn name(&self) -> &'static str {
        "strict"
    }

    fn recover(&self, raw: &str) -> Option<Value> {
        serde_json::from_str(raw).ok()
    }
}

/// Parse the body of the first ```` ```json ```` fenced block
#[derive(Debug, Clone, Copy, Default)]
pub struct FencedBlock;

impl RecoveryStrategy for FencedBlock {
    fn name(&self) -> &'static str {
        "fenced"
    }

    fn recover(&self, raw: &str) -> Option<Value> {
        const OPEN: &str = "```json";
        let body_start = raw.find(OPEN)? + OPEN.len();
        let rest = &raw[body_start..];
        let body_end = rest.find("```")?;
        let value: Value = serde_json::from_str(rest[..body_end].trim()).ok()?;
        value.is_object().then_some(value)
    }
}

/// Parse the span from the first `{` to the last `}`
#[derive(Debug, Clone, Copy, Default)]
pub struct BraceSpan;

impl RecoveryStrategy for BraceSpan {
    fn name(&self) -> &'static str {
        "brace-span"
    }

    fn recover(&self, raw: &str) -> Option<Value> {
        let start = raw.find('{')?;
        let end = raw.rfind('}')?;
        if end < start {
            return None;
        }
        serde_json::from_str(&raw[start..=end]).ok()
    }
}

/// Ordered chain of recovery strategies
pub struct JsonRecoveryParser {
    strategies: Vec<Box<dyn RecoveryStrategy>>,
}

impl JsonRecoveryParser {
    /// Create a parser with a custom strategy chain
    pub fn new(strategies: Vec<Box<dyn RecoveryStrategy>>) -> Self {
        Self { strategies }
    }

    /// Parse `raw`, trying each strategy in order
    pub fn parse(&self, raw: &str) -> Option<Value> {
        self.strategies.iter().find_map(|strategy| {
            let value = strategy.recover(raw)?;
            debug!(strategy = strategy.name(), "Recovered JSON from model reply");
            Some(value)
        })
    }
}

impl Default for JsonRecoveryParser {
    /// Strict, then fenced block, then brace span
    fn default() -> Self {
        Self::new(vec![
            Box::new(StrictJson),
            Box::new(FencedBlock),
            Box::new(BraceSpan),
        ])
    }
}

/// The `rows` array of a parsed reply, if it has one
pub fn rows_of(value: &Value) -> Option<&Vec<Value>> {
    value.get("rows").and_then(Value::as_array)
}
