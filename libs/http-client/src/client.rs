use std::sync::Arc;

use common_errors::{AppError, AppResult};
use http::Method;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthProvider,
    options::RequestOptions,
    transport::{Transport, TransportError, TransportRequest},
};

/// Standard response wrapper used by the posts API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: u16,
    pub message: String,
    pub data: T,
    pub success: bool,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 200,
            message: "success".to_string(),
            data,
            success: true,
        }
    }
}

/// JSON API client that adds bearer auth and translates failures into
/// [`AppError`].
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    auth: Arc<dyn AuthProvider>,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>, auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self { transport, auth }
    }

    pub fn auth(&self) -> &Arc<dyn AuthProvider> { &self.auth }

    pub async fn get<R: DeserializeOwned>(
        &self, path: &str, options: &RequestOptions,
    ) -> AppResult<R> {
        self.send(Method::GET, path, None, options).await
    }

    pub async fn post<B: Serialize + Sync, R: DeserializeOwned>(
        &self, path: &str, body: &B, options: &RequestOptions,
    ) -> AppResult<R> {
        let body = serde_json::to_value(body)?;
        self.send(Method::POST, path, Some(body), options).await
    }

    pub async fn put<B: Serialize + Sync, R: DeserializeOwned>(
        &self, path: &str, body: &B, options: &RequestOptions,
    ) -> AppResult<R> {
        let body = serde_json::to_value(body)?;
        self.send(Method::PUT, path, Some(body), options).await
    }

    pub async fn patch<B: Serialize + Sync, R: DeserializeOwned>(
        &self, path: &str, body: &B, options: &RequestOptions,
    ) -> AppResult<R> {
        let body = serde_json::to_value(body)?;
        self.send(Method::PATCH, path, Some(body), options).await
    }

    pub async fn delete(
        &self, path: &str, options: &RequestOptions,
    ) -> AppResult<()> {
        self.execute(Method::DELETE, path, None, options).await
    }

    /// Sends a request and unwraps the `data` field of the envelope.
    pub async fn send<R: DeserializeOwned>(
        &self, method: Method, path: &str, body: Option<Value>,
        options: &RequestOptions,
    ) -> AppResult<R> {
        let body = self.round_trip(method, path, body, options).await?;
        let envelope: ApiEnvelope<Value> = serde_json::from_value(body)?;
        if !envelope.success {
            return Err(AppError::from_status(
                envelope.code,
                &envelope.message,
                None,
            ));
        }
        Ok(serde_json::from_value(envelope.data)?)
    }

    /// Sends a request whose response payload is irrelevant.
    pub async fn execute(
        &self, method: Method, path: &str, body: Option<Value>,
        options: &RequestOptions,
    ) -> AppResult<()> {
        let body = self.round_trip(method, path, body, options).await?;
        if body.get("success") == Some(&Value::Bool(false)) {
            let code = body
                .get("code")
                .and_then(Value::as_u64)
                .and_then(|code| u16::try_from(code).ok())
                .unwrap_or(500);
            return Err(AppError::from_status(
                code,
                &error_message(&body, "Request failed"),
                None,
            ));
        }
        Ok(())
    }

    #[instrument(
        skip(self, body, options),
        fields(request_id = tracing::field::Empty)
    )]
    async fn round_trip(
        &self, method: Method, path: &str, body: Option<Value>,
        options: &RequestOptions,
    ) -> AppResult<Value> {
        let request_id = Uuid::now_v7();
        tracing::Span::current()
            .record("request_id", tracing::field::display(request_id));

        let mut request = TransportRequest::new(method, path);
        request.body = body;
        request.timeout = options.timeout;
        request
            .headers
            .push(("Accept".to_string(), "application/json".to_string()));
        if request.body.is_some() {
            request.headers.push((
                "Content-Type".to_string(),
                "application/json".to_string(),
            ));
        }
        if !options.skip_auth {
            if let Some(token) = self.auth.token().await {
                request
                    .headers
                    .push(("Authorization".to_string(), format!("Bearer {token}")));
            }
        }

        debug!("Sending {} {}", request.method, request.path);

        let response = self.transport.request(request).await.map_err(
            |err| {
                match err {
                    TransportError::Timeout => {
                        AppError::network("Request timed out")
                    }
                    TransportError::Connection(reason) => {
                        AppError::network(&format!(
                            "Network request failed: {reason}"
                        ))
                    }
                }
            },
        )?;

        debug!("Received {} for {}", response.status, path);

        if response.status.is_success() {
            return Ok(response.body);
        }

        let status = response.status.as_u16();
        let fallback = response
            .status
            .canonical_reason()
            .unwrap_or("Request failed");
        let message = error_message(&response.body, fallback);
        let details = (!response.body.is_null()).then_some(response.body);
        let error = AppError::from_status(status, &message, details);

        match status {
            401 => {
                warn!("Unauthorized response, clearing stored credentials");
                self.auth.clear().await;
            }
            403 => warn!("Forbidden response for {}", path),
            500..=599 => warn!("Server error {} for {}", status, path),
            _ => {}
        }

        Err(error)
    }
}

fn error_message(body: &Value, fallback: &str) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .unwrap_or(fallback)
        .to_string()
}
