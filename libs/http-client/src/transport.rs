use std::time::Duration;

use async_trait::async_trait;
use http::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Option<Duration>,
}

impl TransportRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    /// `Value::Null` when the response had no body.
    pub body: Value,
}

impl TransportResponse {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }
}

/// Failures below the HTTP layer; these never carry a status code.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Request timed out")]
    Timeout,
}

/// The wire seam. Anything that can move a JSON request to a server and
/// bring a status plus JSON body back.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self, request: TransportRequest,
    ) -> Result<TransportResponse, TransportError>;
}
