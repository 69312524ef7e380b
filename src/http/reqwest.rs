//! Default [`HttpTransport`] backed by `reqwest`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;

use crate::error::ChatError;

use super::{
    DynHttpTransport, HttpBodyStream, HttpRequest, HttpResponse, HttpStreamResponse, HttpTransport,
};

/// reqwest-backed transport.
///
/// Honors the per-request timeout and performs up to `max_retries` extra
/// connection attempts when no response was received at all. Once a response
/// arrives, whatever its status, it is handed to the adapter unmodified.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a transport with a default client configuration.
    pub fn default_client() -> Result<Self, ChatError> {
        Client::builder()
            .build()
            .map(Self::new)
            .map_err(|err| ChatError::api(format!("failed to create http client: {err}")))
    }

    fn build_request(&self, request: &HttpRequest) -> Result<reqwest::RequestBuilder, ChatError> {
        let mut builder = self.client.post(&request.url);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        for (name, value) in &request.headers {
            let header_name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| ChatError::api(format!("invalid header name: {err}")))?;
            let header_value = reqwest::header::HeaderValue::from_str(value).map_err(|err| {
                ChatError::api(format!("invalid header value for {header_name}: {err}"))
            })?;
            builder = builder.header(header_name, header_value);
        }
        Ok(builder.body(request.body.clone()))
    }

    /// Issues the request, re-dialing on connect/timeout failures until the
    /// retry budget is spent.
    async fn send_with_retries(
        &self,
        request: &HttpRequest,
    ) -> Result<reqwest::Response, ChatError> {
        let mut attempt = 0u32;
        loop {
            match self.build_request(request)?.send().await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    let retryable = err.is_connect() || err.is_timeout();
                    if retryable && attempt < request.max_retries {
                        attempt += 1;
                        tracing::debug!(attempt, url = %request.url, "retrying connection");
                        continue;
                    }
                    return Err(ChatError::api(err.to_string()));
                }
            }
        }
    }

    fn headers_to_map(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ChatError> {
        let response = self.send_with_retries(&request).await?;
        let status = response.status().as_u16();
        let headers = Self::headers_to_map(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|err| ChatError::api(err.to_string()))?
            .to_vec();
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    async fn send_stream(&self, request: HttpRequest) -> Result<HttpStreamResponse, ChatError> {
        let response = self.send_with_retries(&request).await?;
        let status = response.status().as_u16();
        let headers = Self::headers_to_map(response.headers());
        let stream = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|err| ChatError::api(err.to_string()))
        });
        let body: HttpBodyStream = Box::pin(stream);
        Ok(HttpStreamResponse {
            status,
            headers,
            body,
        })
    }
}

/// Convenience constructor for the default thread-safe transport.
pub fn default_dyn_transport() -> Result<DynHttpTransport, ChatError> {
    Ok(Arc::new(ReqwestTransport::default_client()?))
}
