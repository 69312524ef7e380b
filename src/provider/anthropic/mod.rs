//! Adapter for the Anthropic Messages API.
//!
//! Claude models refuse requests without a token cap, so this vendor's
//! default table forces `max_tokens` when the caller left it unset. The
//! wire format also takes the system directive as a top-level field rather
//! than a message, an adapter-local transform over the shared ordering.

mod error;
mod request;
mod response;
mod stream;
mod types;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::config::{ProviderConfig, VendorDefaults};
use crate::error::ChatError;
use crate::http::{DynHttpTransport, HttpResponse, post_json, post_json_stream};
use crate::provider::{ChunkStream, Provider};
use crate::stream::{SseChunkStream, collect_stream_text};
use crate::types::{ChatResponse, Message};

use self::error::classify_status;
use self::types::MessagesResponse;

const DEFAULTS: VendorDefaults = VendorDefaults {
    model: "claude-3-5-sonnet-20241022",
    base_url: "https://api.anthropic.com",
    require_max_tokens: Some(4096),
};

const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages provider.
pub struct AnthropicProvider {
    config: ProviderConfig,
    transport: DynHttpTransport,
    endpoint: String,
}

impl AnthropicProvider {
    pub fn new(config: ProviderConfig, transport: DynHttpTransport) -> Result<Self, ChatError> {
        let config = config.resolve(&DEFAULTS)?;
        let endpoint = messages_url(config.base_url.as_deref().unwrap_or_default());
        Ok(Self {
            config,
            transport,
            endpoint,
        })
    }

    fn build_headers(&self) -> HashMap<String, String> {
        HashMap::from([
            (
                "x-api-key".to_string(),
                self.config.api_key.expose().to_string(),
            ),
            ("anthropic-version".to_string(), API_VERSION.to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ])
    }

    fn ensure_success(&self, response: HttpResponse) -> Result<String, ChatError> {
        let status = response.status;
        let text = response.into_string()?;
        if (200..300).contains(&status) {
            Ok(text)
        } else {
            Err(classify_status(status, &text))
        }
    }
}

fn messages_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with("/v1") {
        format!("{base}/messages")
    } else {
        format!("{base}/v1/messages")
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    async fn chat(&self, messages: &[Message]) -> Result<ChatResponse, ChatError> {
        let body = request::build_body(&self.config, messages, false);
        tracing::debug!(provider = "anthropic", endpoint = %self.endpoint, "chat request");
        let response = post_json(
            self.transport.as_ref(),
            self.endpoint.clone(),
            self.build_headers(),
            &body,
            self.config.timeout,
            self.config.max_retries,
        )
        .await?;
        let text = self.ensure_success(response)?;
        let parsed: MessagesResponse = serde_json::from_str(&text).map_err(|err| {
            ChatError::provider("anthropic", format!("failed to parse response: {err}"))
        })?;
        Ok(response::map_response(parsed))
    }

    async fn stream_chat(&self, messages: &[Message]) -> Result<ChunkStream, ChatError> {
        let body = request::build_body(&self.config, messages, true);
        tracing::debug!(provider = "anthropic", endpoint = %self.endpoint, "stream request");
        let response = post_json_stream(
            self.transport.as_ref(),
            self.endpoint.clone(),
            self.build_headers(),
            &body,
            self.config.timeout,
            self.config.max_retries,
        )
        .await?;
        if !(200..300).contains(&response.status) {
            let text = collect_stream_text(response.body, "anthropic").await?;
            return Err(classify_status(response.status, &text));
        }
        Ok(Box::pin(SseChunkStream::new(
            response.body,
            "anthropic",
            stream::chunk_parser(),
            None,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_url_handles_versioned_and_bare_bases() {
        assert_eq!(
            messages_url("https://api.anthropic.com"),
            "https://api.anthropic.com/v1/messages"
        );
        assert_eq!(
            messages_url("https://proxy.example/v1"),
            "https://proxy.example/v1/messages"
        );
    }
}
