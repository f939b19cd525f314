use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

use super::{HttpResponse, TransportError};

/// A single outbound JSON POST, no retries. Allows mocking.
pub trait HttpTransport: Send + Sync {
    fn post_json(
        &self,
        endpoint: &str,
        payload: &Value,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError>;
}

/// Blocking HTTP client for the hosted model services.
///
/// A `reqwest::blocking::Client` owns an internal runtime and must neither be
/// built nor dropped on an async worker thread. The client is therefore built
/// on the first call, which always runs on a blocking thread, and handed to a
/// plain thread on drop when a tokio runtime is current.
pub struct ReqwestTransport {
    client: Mutex<Option<reqwest::blocking::Client>>,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Mutex::new(None),
        }
    }

    fn client(&self) -> Result<reqwest::blocking::Client, TransportError> {
        let mut slot = self
            .client
            .lock()
            .map_err(|_| TransportError::InvalidRequest("HTTP client lock poisoned".into()))?;
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("herbheal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        *slot = Some(client.clone());
        Ok(client)
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ReqwestTransport {
    fn drop(&mut self) {
        let Some(client) = self.client.get_mut().ok().and_then(Option::take) else {
            return;
        };
        if tokio::runtime::Handle::try_current().is_ok() {
            std::thread::spawn(move || drop(client));
        }
    }
}

impl HttpTransport for ReqwestTransport {
    fn post_json(
        &self,
        endpoint: &str,
        payload: &Value,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError> {
        let mut request = self.client()?.post(endpoint).timeout(timeout).json(payload);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(timeout.as_secs())
            } else if e.is_connect() {
                TransportError::Connection(host_of(endpoint).to_string())
            } else if e.is_builder() {
                TransportError::InvalidRequest(e.to_string())
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response.text().map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(timeout.as_secs())
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Host part of an endpoint, for error messages and log fields.
///
/// Never includes the query string, where some services accept API keys.
pub fn host_of(endpoint: &str) -> &str {
    let rest = endpoint
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(endpoint);
    rest.split(['/', '?']).next().unwrap_or(rest)
}

/// One request seen by `MockTransport`.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub endpoint: String,
    pub payload: Value,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

/// Mock transport for testing: replays scripted results in order and records
/// every request it receives.
pub struct MockTransport {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new(script: Vec<Result<HttpResponse, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers the first request with a 200 and the given JSON body.
    pub fn ok_json(body: &Value) -> Self {
        Self::new(vec![Ok(HttpResponse::ok(body.to_string()))])
    }

    /// Fails the first `count` requests with `status`.
    pub fn failing_status(status: u16, count: usize) -> Self {
        let script = (0..count)
            .map(|_| {
                Err(TransportError::Status {
                    status,
                    body: format!("scripted {status}"),
                })
            })
            .collect();
        Self::new(script)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

impl HttpTransport for MockTransport {
    fn post_json(
        &self,
        endpoint: &str,
        payload: &Value,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                endpoint: endpoint.to_string(),
                payload: payload.clone(),
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                timeout,
            });
        }

        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| Err(TransportError::Network("mock script exhausted".into())))
    }
}
