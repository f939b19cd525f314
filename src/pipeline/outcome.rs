use serde::{Deserialize, Serialize};

/// Result of a stage that never fails the pipeline.
///
/// `Degraded` carries a usable fallback value plus the reason the real one
/// could not be produced. Fatal conditions are reported through `Err`, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum StageOutcome<T> {
    Completed(T),
    Degraded { value: T, reason: String },
}

impl<T> StageOutcome<T> {
    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Self::Degraded {
            value,
            reason: reason.into(),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Completed(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Completed(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Completed(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accessors_cover_both_variants() {
        let done = StageOutcome::Completed(7);
        assert_eq!(*done.value(), 7);
        assert!(!done.is_degraded());
        assert_eq!(done.reason(), None);

        let degraded = StageOutcome::degraded(0, "timed out");
        assert!(degraded.is_degraded());
        assert_eq!(degraded.reason(), Some("timed out"));
        assert_eq!(degraded.into_value(), 0);
    }

    #[test]
    fn serializes_with_status_tag() {
        let done = serde_json::to_value(StageOutcome::Completed("ok")).unwrap();
        assert_eq!(done, json!({"status": "completed", "data": "ok"}));

        let degraded = serde_json::to_value(StageOutcome::degraded("fallback", "HTTP 429")).unwrap();
        assert_eq!(
            degraded,
            json!({"status": "degraded", "data": {"value": "fallback", "reason": "HTTP 429"}})
        );
    }
}
