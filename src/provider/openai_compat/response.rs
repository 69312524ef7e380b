use crate::types::{ChatResponse, Usage};

use super::types::ChatCompletion;

/// Normalizes a chat-completions payload into the canonical response shape.
///
/// Usage is carried over only when the vendor reported it; an absent usage
/// block stays `None`.
pub(crate) fn map_response(payload: ChatCompletion) -> ChatResponse {
    let raw = serde_json::to_value(&payload).ok();
    let choice = payload.choices.first();
    let content = choice
        .and_then(|c| c.message.as_ref())
        .and_then(|m| m.content.clone())
        .unwrap_or_default();
    let finish_reason = choice.and_then(|c| c.finish_reason.clone());
    let usage = payload.usage.as_ref().map(|u| Usage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });
    ChatResponse {
        content,
        model: payload.model,
        usage,
        finish_reason,
        raw_response: raw,
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::{Choice, ChoiceMessage, UsagePayload};
    use super::*;

    #[test]
    fn map_response_extracts_content_usage_and_finish_reason() {
        let payload = ChatCompletion {
            model: "gpt-4o-mini".to_string(),
            choices: vec![Choice {
                message: Some(ChoiceMessage {
                    content: Some("hello".to_string()),
                }),
                finish_reason: Some("stop".to_string()),
            }],
            usage: Some(UsagePayload {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        };
        let mapped = map_response(payload);
        assert_eq!(mapped.content, "hello");
        assert_eq!(mapped.model, "gpt-4o-mini");
        assert_eq!(mapped.finish_reason.as_deref(), Some("stop"));
        let usage = mapped.usage.expect("usage");
        assert_eq!(usage.prompt_tokens, 10);
        assert_eq!(usage.completion_tokens, 5);
        assert_eq!(usage.total_tokens, 15);
        assert!(mapped.raw_response.is_some());
    }

    #[test]
    fn missing_usage_stays_absent() {
        let payload = ChatCompletion {
            model: "m".to_string(),
            choices: vec![Choice {
                message: Some(ChoiceMessage { content: None }),
                finish_reason: None,
            }],
            usage: None,
        };
        let mapped = map_response(payload);
        assert!(mapped.usage.is_none());
        assert_eq!(mapped.content, "");
    }

    #[test]
    fn empty_choices_yield_empty_content() {
        let payload = ChatCompletion {
            model: "m".to_string(),
            choices: Vec::new(),
            usage: None,
        };
        let mapped = map_response(payload);
        assert_eq!(mapped.content, "");
        assert!(mapped.finish_reason.is_none());
    }
}
