use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result placed in the envelope once every attempt has failed.
pub const FAILURE_SENTINEL: &str = "I failed at my mission :(";

/// What an invocation hands back. Metadata keys are omitted, never null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    // Set only by `failure()`; a function may legitimately return the sentinel text.
    #[serde(skip)]
    exhausted: bool,
}

impl ResultEnvelope {
    pub fn success(result: Value, code: String, input: &str, prompt: String, include_metadata: bool) -> Self {
        if !include_metadata {
            return Self::bare(result);
        }
        Self {
            result,
            code: Some(code),
            input: Some(input.to_string()),
            prompt: Some(prompt),
            exhausted: false,
        }
    }

    /// Minimal envelope, whatever metadata was asked for.
    pub fn failure() -> Self {
        Self {
            exhausted: true,
            ..Self::bare(Value::String(FAILURE_SENTINEL.to_string()))
        }
    }

    fn bare(result: Value) -> Self {
        Self { result, code: None, input: None, prompt: None, exhausted: false }
    }

    /// True only for the envelope built after every attempt failed.
    pub fn is_failure(&self) -> bool {
        self.exhausted
    }

    pub fn has_metadata(&self) -> bool {
        self.code.is_some() || self.input.is_some() || self.prompt.is_some()
    }
}
