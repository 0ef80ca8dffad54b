pub mod auth;
pub mod client;
pub mod options;
pub mod retry;
pub mod transport;

pub use auth::{AuthProvider, TokenStore};
pub use client::{ApiClient, ApiEnvelope};
pub use http::{Method, StatusCode};
pub use options::RequestOptions;
pub use retry::{RetryPolicy, retry, with_retry};
pub use transport::{
    Transport, TransportError, TransportRequest, TransportResponse,
};
