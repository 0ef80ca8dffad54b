use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use http_client::{
    StatusCode, Transport, TransportError, TransportRequest,
    TransportResponse,
};
use serde::Serialize;
use serde_json::{Value, json};

type Reply = Result<TransportResponse, TransportError>;

/// In-memory [`Transport`] that records every request and answers from a
/// script. Once the script is exhausted it answers with an empty success
/// envelope.
#[derive(Clone, Default)]
pub struct StubTransport {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    seen: Arc<Mutex<Vec<TransportRequest>>>,
}

impl StubTransport {
    pub fn new() -> Self { Self::default() }

    pub fn push(&self, reply: Reply) -> &Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
        self
    }

    /// Queues a 200 response wrapping `data` in the success envelope.
    pub fn ok<T: Serialize>(&self, data: &T) -> &Self {
        let data = serde_json::to_value(data).unwrap_or(Value::Null);
        self.push(Ok(TransportResponse::new(StatusCode::OK, envelope(data))))
    }

    pub fn status(&self, status: StatusCode, body: Value) -> &Self {
        self.push(Ok(TransportResponse::new(status, body)))
    }

    pub fn fail(&self, error: TransportError) -> &Self { self.push(Err(error)) }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<TransportRequest> {
        self.requests().pop()
    }
}

pub fn envelope(data: Value) -> Value {
    json!({"code": 200, "message": "success", "data": data, "success": true})
}

#[async_trait]
impl Transport for StubTransport {
    async fn request(
        &self, request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request);
        }
        let next = self.replies.lock().ok().and_then(|mut r| r.pop_front());
        next.unwrap_or_else(|| {
            Ok(TransportResponse::new(StatusCode::OK, envelope(Value::Null)))
        })
    }
}
