//! Adapter for the OpenAI-compatible chat-completions family.
//!
//! Several vendors speak this wire protocol verbatim; they differ only in
//! credentials, endpoints, and default models. One adapter therefore serves
//! both the `openai` and `deepseek` registry names, parameterized by a
//! vendor default table.

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
use self::types::ChatCompletion;

const OPENAI_DEFAULTS: VendorDefaults = VendorDefaults {
    model: "gpt-4o-mini",
    base_url: "https://api.openai.com/v1",
    require_max_tokens: None,
};

const DEEPSEEK_DEFAULTS: VendorDefaults = VendorDefaults {
    model: "deepseek-chat",
    base_url: "https://api.deepseek.com",
    require_max_tokens: None,
};

/// Chat-completions provider for OpenAI-compatible vendors.
pub struct OpenAiCompatProvider {
    name: &'static str,
    config: ProviderConfig,
    transport: DynHttpTransport,
    endpoint: String,
}

impl OpenAiCompatProvider {
    /// Builds the adapter against api.openai.com defaults.
    pub fn openai(
        config: ProviderConfig,
        transport: DynHttpTransport,
    ) -> Result<Self, ChatError> {
        Self::with_defaults("openai", &OPENAI_DEFAULTS, config, transport)
    }

    /// Builds the adapter against api.deepseek.com defaults.
    pub fn deepseek(
        config: ProviderConfig,
        transport: DynHttpTransport,
    ) -> Result<Self, ChatError> {
        Self::with_defaults("deepseek", &DEEPSEEK_DEFAULTS, config, transport)
    }

    fn with_defaults(
        name: &'static str,
        defaults: &VendorDefaults,
        config: ProviderConfig,
        transport: DynHttpTransport,
    ) -> Result<Self, ChatError> {
        let config = config.resolve(defaults)?;
        let endpoint = chat_completions_url(config.base_url.as_deref().unwrap_or_default());
        Ok(Self {
            name,
            config,
            transport,
            endpoint,
        })
    }

    fn build_headers(&self) -> HashMap<String, String> {
        HashMap::from([
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.config.api_key.expose()),
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
            Err(classify_status(self.name, status, &text))
        }
    }
}

fn chat_completions_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with("/v1") {
        format!("{base}/chat/completions")
    } else {
        format!("{base}/v1/chat/completions")
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    async fn chat(&self, messages: &[Message]) -> Result<ChatResponse, ChatError> {
        let body = request::build_body(&self.config, messages, false);
        tracing::debug!(provider = self.name, endpoint = %self.endpoint, "chat request");
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
        let parsed: ChatCompletion = serde_json::from_str(&text).map_err(|err| {
            ChatError::provider(self.name, format!("failed to parse response: {err}"))
        })?;
        Ok(response::map_response(parsed))
    }

    async fn stream_chat(&self, messages: &[Message]) -> Result<ChunkStream, ChatError> {
        let body = request::build_body(&self.config, messages, true);
        tracing::debug!(provider = self.name, endpoint = %self.endpoint, "stream request");
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
            let text = collect_stream_text(response.body, self.name).await?;
            return Err(classify_status(self.name, response.status, &text));
        }
        Ok(Box::pin(SseChunkStream::new(
            response.body,
            self.name,
            stream::chunk_parser(self.name),
            None,
        )))
    }
}
