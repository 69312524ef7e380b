//! Minimal HTTP transport abstraction decoupling providers from the concrete
//! HTTP client.
//!
//! Every vendor in this crate speaks JSON over POST, so the surface is
//! deliberately small: one blocking exchange and one streaming exchange.
//! Connection failures map to [`ChatError::Api`] with no status; the bounded
//! reconnect count configured per provider is honored here and nowhere else.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_core::Stream;
use serde::Serialize;

use crate::error::ChatError;

pub mod reqwest;

/// JSON POST request shared across providers.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    /// Per-request timeout taken from the provider config.
    pub timeout: Option<Duration>,
    /// Additional connection attempts permitted after the first failure.
    pub max_retries: u32,
}

impl HttpRequest {
    /// Builds a POST request carrying a JSON body.
    pub fn post_json(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::from([(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )]),
            body,
            timeout: None,
            max_retries: 0,
        }
    }

    /// Replaces the request headers wholesale.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Decodes the body as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Api`] when the payload is not valid UTF-8.
    pub fn into_string(self) -> Result<String, ChatError> {
        String::from_utf8(self.body).map_err(|err| ChatError::api(err.to_string()))
    }
}

/// HTTP response whose body arrives incrementally.
pub struct HttpStreamResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: HttpBodyStream,
}

/// Byte stream returned by [`HttpTransport::send_stream`].
pub type HttpBodyStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, ChatError>> + Send>>;

/// Transport contract each vendor adapter calls through.
///
/// Implementations map every failure to [`ChatError::Api`]; classification
/// into finer variants happens in the adapters once a status and body are
/// available.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and resolves once the full response is buffered.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ChatError>;

    /// Sends a request and returns the response with a streaming body.
    async fn send_stream(&self, request: HttpRequest) -> Result<HttpStreamResponse, ChatError>;
}

/// Thread-safe handle to a transport implementation.
pub type DynHttpTransport = Arc<dyn HttpTransport>;

/// Serializes `body` to JSON and issues a POST through the transport.
pub async fn post_json<T: Serialize>(
    transport: &dyn HttpTransport,
    url: impl Into<String>,
    headers: HashMap<String, String>,
    body: &T,
    timeout: Duration,
    max_retries: u32,
) -> Result<HttpResponse, ChatError> {
    let payload = encode_body(body)?;
    let request = HttpRequest::post_json(url, payload)
        .with_headers(headers)
        .with_timeout(timeout)
        .with_retries(max_retries);
    transport.send(request).await
}

/// Streaming variant of [`post_json`].
pub async fn post_json_stream<T: Serialize>(
    transport: &dyn HttpTransport,
    url: impl Into<String>,
    headers: HashMap<String, String>,
    body: &T,
    timeout: Duration,
    max_retries: u32,
) -> Result<HttpStreamResponse, ChatError> {
    let payload = encode_body(body)?;
    let request = HttpRequest::post_json(url, payload)
        .with_headers(headers)
        .with_timeout(timeout)
        .with_retries(max_retries);
    transport.send_stream(request).await
}

fn encode_body<T: Serialize>(body: &T) -> Result<Vec<u8>, ChatError> {
    serde_json::to_vec(body)
        .map_err(|err| ChatError::api(format!("failed to serialize request body: {err}")))
}
