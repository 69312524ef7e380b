use crate::types::{ChatResponse, Usage};

use super::types::MessagesResponse;

/// Normalizes a Messages API payload into the canonical response shape.
pub(crate) fn map_response(payload: MessagesResponse) -> ChatResponse {
    let raw = serde_json::to_value(&payload).ok();
    let content: String = payload
        .content
        .iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text.as_deref())
        .collect();
    let usage = payload.usage.as_ref().map(|u| Usage {
        prompt_tokens: u.input_tokens,
        completion_tokens: u.output_tokens,
        total_tokens: u.input_tokens + u.output_tokens,
    });
    ChatResponse {
        content,
        model: payload.model,
        usage,
        finish_reason: payload.stop_reason,
        raw_response: raw,
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::{ContentBlock, UsagePayload};
    use super::*;

    #[test]
    fn text_blocks_concatenate_and_usage_totals() {
        let payload = MessagesResponse {
            model: "claude-3-5-sonnet-20241022".to_string(),
            content: vec![
                ContentBlock {
                    kind: "text".to_string(),
                    text: Some("Hello ".to_string()),
                },
                ContentBlock {
                    kind: "text".to_string(),
                    text: Some("there".to_string()),
                },
            ],
            stop_reason: Some("end_turn".to_string()),
            usage: Some(UsagePayload {
                input_tokens: 12,
                output_tokens: 3,
            }),
        };
        let mapped = map_response(payload);
        assert_eq!(mapped.content, "Hello there");
        assert_eq!(mapped.finish_reason.as_deref(), Some("end_turn"));
        let usage = mapped.usage.expect("usage");
        assert_eq!(usage.prompt_tokens, 12);
        assert_eq!(usage.completion_tokens, 3);
        assert_eq!(usage.total_tokens, 15);
    }

    #[test]
    fn non_text_blocks_are_skipped_and_missing_usage_stays_absent() {
        let payload = MessagesResponse {
            model: "m".to_string(),
            content: vec![ContentBlock {
                kind: "thinking".to_string(),
                text: Some("hidden".to_string()),
            }],
            stop_reason: None,
            usage: None,
        };
        let mapped = map_response(payload);
        assert_eq!(mapped.content, "");
        assert!(mapped.usage.is_none());
    }
}
