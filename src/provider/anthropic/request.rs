use serde_json::{Value, json};

use crate::config::ProviderConfig;
use crate::provider::prepare_messages;
use crate::types::{Message, Role};

/// Builds a Messages API request body.
///
/// The shared preparation yields the directive-first ordering; this vendor
/// moves system-role entries into the top-level `system` field (joined in
/// order) because the messages array only accepts user/assistant turns.
pub(crate) fn build_body(config: &ProviderConfig, messages: &[Message], stream: bool) -> Value {
    let prepared = prepare_messages(config.system_prompt.as_deref(), messages);

    let mut system_parts: Vec<String> = Vec::new();
    let mut turns: Vec<&Message> = Vec::new();
    for message in &prepared {
        match message.role {
            Role::System => system_parts.push(message.content.clone()),
            _ => turns.push(message),
        }
    }

    let mut body = json!({
        "model": config.model,
        "messages": turns,
        "temperature": config.temperature,
        "stream": stream,
    });
    // resolve() guarantees a cap for this vendor family.
    if let Some(max_tokens) = config.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    if !system_parts.is_empty() {
        body["system"] = json!(system_parts.join("\n\n"));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProviderConfig {
        let mut config = ProviderConfig::new("key");
        config.model = "claude-test".to_string();
        config.max_tokens = Some(4096);
        config
    }

    #[test]
    fn directive_becomes_top_level_system_field() {
        let mut config = config();
        config.system_prompt = Some("Be kind.".to_string());
        let body = build_body(&config, &[Message::user("hi")], false);
        assert_eq!(body["system"], "Be kind.");
        let messages = body["messages"].as_array().expect("messages");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
    }

    #[test]
    fn in_history_system_messages_join_the_system_field_in_order() {
        let mut config = config();
        config.system_prompt = Some("First.".to_string());
        let history = vec![Message::system("Second."), Message::user("hi")];
        let body = build_body(&config, &history, false);
        assert_eq!(body["system"], "First.\n\nSecond.");
    }

    #[test]
    fn max_tokens_is_always_present_for_this_vendor() {
        let body = build_body(&config(), &[], true);
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["stream"], true);
        assert!(body.get("system").is_none());
    }
}
