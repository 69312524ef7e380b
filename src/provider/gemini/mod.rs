//! Adapter for the Google Gemini GenerateContent API.
//!
//! Gemini accepts structured contents, but this adapter serializes the
//! conversation into one flattened text prompt for broad model
//! compatibility. That is an adapter-local transform layered on the shared
//! directive-first ordering, which stays intact inside the flattened text.
//! The streaming protocol carries no `[DONE]` marker, so the terminal chunk
//! is synthesized when the feed ends.

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
use self::types::GenerateContentResponse;

const DEFAULTS: VendorDefaults = VendorDefaults {
    model: "gemini-2.0-flash",
    base_url: "https://generativelanguage.googleapis.com",
    require_max_tokens: None,
};

/// Gemini GenerateContent provider.
pub struct GeminiProvider {
    config: ProviderConfig,
    transport: DynHttpTransport,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig, transport: DynHttpTransport) -> Result<Self, ChatError> {
        let config = config.resolve(&DEFAULTS)?;
        Ok(Self { config, transport })
    }

    fn base(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or_default()
    }

    fn generate_url(&self) -> String {
        let base = self.base().trim_end_matches('/');
        let model = normalize_model(&self.config.model);
        if base.ends_with("/v1beta") {
            format!("{base}/{model}:generateContent")
        } else {
            format!("{base}/v1beta/{model}:generateContent")
        }
    }

    fn stream_url(&self) -> String {
        let base = self.base().trim_end_matches('/');
        let model = normalize_model(&self.config.model);
        if base.ends_with("/v1beta") {
            format!("{base}/{model}:streamGenerateContent?alt=sse")
        } else {
            format!("{base}/v1beta/{model}:streamGenerateContent?alt=sse")
        }
    }

    fn build_headers(&self) -> HashMap<String, String> {
        HashMap::from([
            (
                "x-goog-api-key".to_string(),
                self.config.api_key.expose().to_string(),
            ),
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

fn normalize_model(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        self.generate_url()
    }

    async fn chat(&self, messages: &[Message]) -> Result<ChatResponse, ChatError> {
        let endpoint = self.generate_url();
        let body = request::build_body(&self.config, messages);
        tracing::debug!(provider = "gemini", endpoint = %endpoint, "chat request");
        let response = post_json(
            self.transport.as_ref(),
            endpoint,
            self.build_headers(),
            &body,
            self.config.timeout,
            self.config.max_retries,
        )
        .await?;
        let text = self.ensure_success(response)?;
        let parsed: GenerateContentResponse = serde_json::from_str(&text).map_err(|err| {
            ChatError::provider("gemini", format!("failed to parse response: {err}"))
        })?;
        Ok(response::map_response(parsed, &self.config.model))
    }

    async fn stream_chat(&self, messages: &[Message]) -> Result<ChunkStream, ChatError> {
        let endpoint = self.stream_url();
        let body = request::build_body(&self.config, messages);
        tracing::debug!(provider = "gemini", endpoint = %endpoint, "stream request");
        let response = post_json_stream(
            self.transport.as_ref(),
            endpoint,
            self.build_headers(),
            &body,
            self.config.timeout,
            self.config.max_retries,
        )
        .await?;
        if !(200..300).contains(&response.status) {
            let text = collect_stream_text(response.body, "gemini").await?;
            return Err(classify_status(response.status, &text));
        }
        // No [DONE] marker on this protocol; exhaustion ends the stream.
        Ok(Box::pin(SseChunkStream::new(
            response.body,
            "gemini",
            stream::chunk_parser(),
            Some("stop"),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_path_is_prefixed_once() {
        assert_eq!(normalize_model("gemini-2.0-flash"), "models/gemini-2.0-flash");
        assert_eq!(normalize_model("models/gemini-2.0-flash"), "models/gemini-2.0-flash");
    }
}
