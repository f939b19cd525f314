use serde::{Deserialize, Serialize};

/// Token counts reported by a model service. Zero when the service omits usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
}

/// Which model produced a value, at what cost, and whether it degraded.
///
/// Attached for observability only; no pipeline decision reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiMetadata {
    pub model: String,
    pub service: String,
    pub tokens: TokenUsage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AiMetadata {
    pub fn new(model: &str, service: &str, tokens: TokenUsage) -> Self {
        Self {
            model: model.to_string(),
            service: service.to_string(),
            tokens,
            error: None,
        }
    }

    /// Metadata for a value produced by a fallback path.
    pub fn degraded(model: &str, service: &str, error: impl Into<String>) -> Self {
        Self {
            model: model.to_string(),
            service: service.to_string(),
            tokens: TokenUsage::default(),
            error: Some(error.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}
