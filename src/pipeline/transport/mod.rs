//! Outbound HTTP to the model services.
//!
//! `HttpTransport` performs exactly one request. `RetryingTransport` wraps it
//! with a `RetryPolicy`: rate limits and server errors are retried with
//! exponential backoff, everything else fails on the spot.

pub mod client;
pub mod policy;
pub mod retrying;

pub use client::*;
pub use policy::*;
pub use retrying::*;

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Could not connect to {0}")]
    Connection(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// HTTP status when the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Raw response of a successful (2xx) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}
