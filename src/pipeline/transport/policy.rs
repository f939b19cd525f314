use std::time::Duration;

use super::TransportError;
use crate::config::DEFAULT_MAX_ATTEMPTS;

/// How a failed attempt should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Rate limiting or server error; worth another attempt.
    Retryable,
    /// Anything else; abort immediately.
    Fatal,
}

/// Classify a transport failure.
///
/// HTTP 429 and every 5xx are retryable. Other statuses, connection and DNS
/// failures, and timeouts are fatal.
pub fn classify(error: &TransportError) -> FailureClass {
    match error.status() {
        Some(429) | Some(500..=599) => FailureClass::Retryable,
        _ => FailureClass::Fatal,
    }
}

/// Default retryability predicate.
pub fn is_retryable(error: &TransportError) -> bool {
    classify(error) == FailureClass::Retryable
}

/// Delay after the given 1-based failed attempt: 2s, 4s, 8s, ...
pub fn exponential_backoff(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

/// Retry behavior, independent of any endpoint.
#[derive(Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: fn(u32) -> Duration,
    pub retryable: fn(&TransportError) -> bool,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: exponential_backoff,
            retryable: is_retryable,
        }
    }
}

impl RetryPolicy {
    /// Same backoff and predicate, different attempt budget (at least one).
    pub fn with_max_attempts(self, max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..self
        }
    }

    /// Delay to wait before retrying after `attempt` failed with `error`.
    ///
    /// `None` means stop: the error is fatal or the budget is spent.
    pub fn next_delay(&self, attempt: u32, error: &TransportError) -> Option<Duration> {
        if attempt >= self.max_attempts || !(self.retryable)(error) {
            return None;
        }
        Some((self.backoff)(attempt))
    }
}
