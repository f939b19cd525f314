use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use super::client::{host_of, HttpTransport};
use super::policy::RetryPolicy;
use super::{HttpResponse, TransportError};

// ──────────────────────────────────────────────
// Sleeping
// ──────────────────────────────────────────────

/// Waits between attempts. Swappable so tests can observe backoff.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Production sleeper: parks the calling thread.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Records requested delays without waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(duration);
        }
    }
}

// ──────────────────────────────────────────────
// RetryOutcome
// ──────────────────────────────────────────────

/// Result of a retried call, with diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    Success {
        response: HttpResponse,
        attempts: u32,
        backoff: Duration,
    },
    Failed {
        error: TransportError,
        attempts: u32,
        backoff: Duration,
    },
}

impl RetryOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. } | Self::Failed { attempts, .. } => *attempts,
        }
    }

    /// Total time spent sleeping between attempts.
    pub fn backoff(&self) -> Duration {
        match self {
            Self::Success { backoff, .. } | Self::Failed { backoff, .. } => *backoff,
        }
    }

    pub fn into_result(self) -> Result<HttpResponse, TransportError> {
        match self {
            Self::Success { response, .. } => Ok(response),
            Self::Failed { error, .. } => Err(error),
        }
    }
}

// ──────────────────────────────────────────────
// RetryingTransport
// ──────────────────────────────────────────────

/// Executes one logical call with bounded retries.
///
/// Holds no per-call state, so one instance can serve any number of
/// independent pipeline runs.
#[derive(Clone)]
pub struct RetryingTransport {
    transport: Arc<dyn HttpTransport>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl RetryingTransport {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            sleeper: Arc::new(ThreadSleeper),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Call `endpoint` at most `max_attempts` times.
    ///
    /// Only failures the policy deems retryable are retried; the backoff
    /// delay is slept before each retry, never before the first attempt and
    /// never after the last.
    pub fn call(
        &self,
        endpoint: &str,
        payload: &Value,
        headers: &[(&str, &str)],
        timeout: Duration,
        max_attempts: u32,
    ) -> RetryOutcome {
        let policy = self.policy.with_max_attempts(max_attempts);
        let host = host_of(endpoint);
        let mut backoff = Duration::ZERO;
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::debug!(host, attempt, max_attempts = policy.max_attempts, "Model call attempt");

            let error = match self.transport.post_json(endpoint, payload, headers, timeout) {
                Ok(response) => {
                    if attempt > 1 {
                        tracing::info!(host, attempt, "Model call succeeded after retry");
                    }
                    return RetryOutcome::Success {
                        response,
                        attempts: attempt,
                        backoff,
                    };
                }
                Err(e) => e,
            };

            match policy.next_delay(attempt, &error) {
                Some(delay) => {
                    tracing::warn!(
                        host,
                        attempt,
                        status = ?error.status(),
                        error = %error,
                        delay_secs = delay.as_secs_f32(),
                        "Model call failed, retrying"
                    );
                    self.sleeper.sleep(delay);
                    backoff += delay;
                }
                None => {
                    tracing::warn!(
                        host,
                        attempt,
                        status = ?error.status(),
                        error = %error,
                        "Model call failed, giving up"
                    );
                    return RetryOutcome::Failed {
                        error,
                        attempts: attempt,
                        backoff,
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::transport::MockTransport;
    use serde_json::json;

    const TIMEOUT: Duration = Duration::from_secs(30);

    fn retrying(mock: Arc<MockTransport>, sleeper: Arc<RecordingSleeper>) -> RetryingTransport {
        RetryingTransport::new(mock).with_sleeper(sleeper)
    }

    #[test]
    fn success_on_first_attempt_does_not_sleep() {
        let mock = Arc::new(MockTransport::ok_json(&json!({"ok": true})));
        let sleeper = Arc::new(RecordingSleeper::new());
        let outcome = retrying(mock.clone(), sleeper.clone()).call(
            "https://api.example/x",
            &json!({}),
            &[],
            TIMEOUT,
            3,
        );

        assert_eq!(outcome.attempts(), 1);
        assert_eq!(outcome.backoff(), Duration::ZERO);
        assert!(sleeper.delays().is_empty());
        assert_eq!(outcome.into_result().unwrap().status, 200);
    }

    #[test]
    fn three_503s_exhaust_with_two_and_four_second_delays() {
        let mock = Arc::new(MockTransport::failing_status(503, 3));
        let sleeper = Arc::new(RecordingSleeper::new());
        let outcome = retrying(mock.clone(), sleeper.clone()).call(
            "https://api.example/x",
            &json!({}),
            &[],
            TIMEOUT,
            3,
        );

        assert_eq!(mock.call_count(), 3);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
        assert_eq!(outcome.attempts(), 3);
        assert_eq!(outcome.backoff(), Duration::from_secs(6));
        assert_eq!(outcome.into_result().unwrap_err().status(), Some(503));
    }

    #[test]
    fn rate_limit_then_success() {
        let mock = Arc::new(MockTransport::new(vec![
            Err(TransportError::Status {
                status: 429,
                body: "slow down".into(),
            }),
            Ok(HttpResponse::ok("{}")),
        ]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let outcome = retrying(mock.clone(), sleeper.clone()).call(
            "https://api.example/x",
            &json!({}),
            &[],
            TIMEOUT,
            3,
        );

        assert!(matches!(outcome, RetryOutcome::Success { attempts: 2, .. }));
        assert_eq!(sleeper.delays(), vec![Duration::from_secs(2)]);
    }

    #[test]
    fn fatal_error_aborts_immediately() {
        let mock = Arc::new(MockTransport::new(vec![
            Err(TransportError::Status {
                status: 401,
                body: "bad key".into(),
            }),
            Ok(HttpResponse::ok("{}")),
        ]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let outcome = retrying(mock.clone(), sleeper.clone()).call(
            "https://api.example/x",
            &json!({}),
            &[],
            TIMEOUT,
            3,
        );

        assert_eq!(mock.call_count(), 1);
        assert!(sleeper.delays().is_empty());
        assert!(matches!(outcome, RetryOutcome::Failed { attempts: 1, .. }));
    }

    #[test]
    fn timeout_is_not_retried() {
        let mock = Arc::new(MockTransport::new(vec![Err(TransportError::Timeout(30))]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let outcome = retrying(mock.clone(), sleeper).call(
            "https://api.example/x",
            &json!({}),
            &[],
            TIMEOUT,
            3,
        );

        assert_eq!(mock.call_count(), 1);
        assert_eq!(
            outcome.into_result().unwrap_err(),
            TransportError::Timeout(30)
        );
    }

    #[test]
    fn never_exceeds_max_attempts() {
        for max in 1..=5u32 {
            let mock = Arc::new(MockTransport::failing_status(500, 10));
            let sleeper = Arc::new(RecordingSleeper::new());
            let outcome = retrying(mock.clone(), sleeper.clone()).call(
                "https://api.example/x",
                &json!({}),
                &[],
                TIMEOUT,
                max,
            );
            assert_eq!(mock.call_count(), max as usize);
            assert_eq!(outcome.attempts(), max);
            assert_eq!(sleeper.delays().len(), max as usize - 1);
        }
    }

    #[test]
    fn passes_headers_and_timeout_through() {
        let mock = Arc::new(MockTransport::ok_json(&json!({})));
        retrying(mock.clone(), Arc::new(RecordingSleeper::new())).call(
            "https://api.example/x",
            &json!({"k": "v"}),
            &[("x-goog-api-key", "secret")],
            Duration::from_secs(12),
            3,
        );

        let request = &mock.requests()[0];
        assert_eq!(request.timeout, Duration::from_secs(12));
        assert_eq!(request.headers[0].0, "x-goog-api-key");
        assert_eq!(request.payload["k"], "v");
    }
}
