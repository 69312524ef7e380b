use serde_json::{Value, json};

use crate::config::ProviderConfig;
use crate::provider::prepare_messages;
use crate::types::Message;

/// Builds a chat-completions request body from the shared wire preparation.
pub(crate) fn build_body(config: &ProviderConfig, messages: &[Message], stream: bool) -> Value {
    let prepared = prepare_messages(config.system_prompt.as_deref(), messages);
    let mut body = json!({
        "model": config.model,
        "messages": prepared,
        "temperature": config.temperature,
        "stream": stream,
    });
    if let Some(max_tokens) = config.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    body
}
