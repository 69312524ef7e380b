use serde_json::{Value, json};

use crate::config::ProviderConfig;
use crate::provider::prepare_messages;
use crate::types::{Message, Role};

/// Builds a GenerateContent request body.
///
/// The prepared conversation is collapsed into one labeled text prompt; the
/// directive-first ordering survives as the leading `System:` line.
pub(crate) fn build_body(config: &ProviderConfig, messages: &[Message]) -> Value {
    let prepared = prepare_messages(config.system_prompt.as_deref(), messages);
    let prompt = flatten_prompt(&prepared);

    let mut generation_config = json!({ "temperature": config.temperature });
    if let Some(max_tokens) = config.max_tokens {
        generation_config["maxOutputTokens"] = json!(max_tokens);
    }

    json!({
        "contents": [ { "parts": [ { "text": prompt } ] } ],
        "generationConfig": generation_config,
    })
}

fn flatten_prompt(messages: &[Message]) -> String {
    let mut lines = Vec::with_capacity(messages.len());
    for message in messages {
        let label = match message.role {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
        };
        lines.push(format!("{label}: {}", message.content));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_flattens_in_order_with_directive_first() {
        let mut config = ProviderConfig::new("key");
        config.model = "gemini-2.0-flash".to_string();
        config.system_prompt = Some("Be terse.".to_string());

        let history = vec![Message::user("hello"), Message::assistant("hi")];
        let body = build_body(&config, &history);
        let prompt = body["contents"][0]["parts"][0]["text"]
            .as_str()
            .expect("prompt text");
        assert_eq!(prompt, "System: Be terse.\nUser: hello\nAssistant: hi");
    }

    #[test]
    fn generation_config_carries_temperature_and_optional_cap() {
        let mut config = ProviderConfig::new("key");
        config.temperature = 0.5;
        let body = build_body(&config, &[]);
        assert_eq!(body["generationConfig"]["temperature"], 0.5);
        assert!(body["generationConfig"].get("maxOutputTokens").is_none());

        config.max_tokens = Some(256);
        let body = build_body(&config, &[]);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
    }
}
