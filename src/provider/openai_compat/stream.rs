use crate::error::ChatError;
use crate::stream::ChunkParser;
use crate::types::StreamChunk;

use super::types::StreamPayload;

/// Maps one chat-completions SSE payload to at most one chunk.
///
/// A delta carrying content yields a fragment; a finish reason marks it
/// final. A choice with neither (the role-announcing prelude) yields
/// nothing. The `[DONE]` marker is consumed upstream.
pub(crate) fn chunk_parser(provider: &'static str) -> ChunkParser {
    Box::new(move |data: &str| {
        let payload: StreamPayload = serde_json::from_str(data).map_err(|err| {
            ChatError::provider(provider, format!("failed to parse stream chunk: {err}"))
        })?;
        let Some(choice) = payload.choices.into_iter().next() else {
            return Ok(None);
        };
        let content = choice
            .delta
            .and_then(|d| d.content)
            .unwrap_or_default();
        let finish_reason = choice.finish_reason;
        if content.is_empty() && finish_reason.is_none() {
            return Ok(None);
        }
        let is_final = finish_reason.is_some();
        Ok(Some(StreamChunk {
            content,
            finish_reason,
            is_final,
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_delta_yields_non_final_chunk() {
        let mut parse = chunk_parser("openai");
        let chunk = parse(r#"{"choices":[{"delta":{"content":"Hel"},"finish_reason":null}]}"#)
            .expect("parse")
            .expect("chunk");
        assert_eq!(chunk.content, "Hel");
        assert!(!chunk.is_final);
    }

    #[test]
    fn finish_signal_without_content_yields_final_empty_chunk() {
        let mut parse = chunk_parser("openai");
        let chunk = parse(r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#)
            .expect("parse")
            .expect("chunk");
        assert!(chunk.content.is_empty());
        assert!(chunk.is_final);
        assert_eq!(chunk.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn content_and_finish_in_one_delta_yield_final_chunk_with_content() {
        let mut parse = chunk_parser("openai");
        let chunk = parse(r#"{"choices":[{"delta":{"content":"!"},"finish_reason":"stop"}]}"#)
            .expect("parse")
            .expect("chunk");
        assert_eq!(chunk.content, "!");
        assert!(chunk.is_final);
    }

    #[test]
    fn role_prelude_and_empty_payloads_yield_nothing() {
        let mut parse = chunk_parser("openai");
        assert!(
            parse(r#"{"choices":[{"delta":{"role":"assistant"},"finish_reason":null}]}"#)
                .expect("parse")
                .is_none()
        );
        assert!(parse(r#"{"choices":[]}"#).expect("parse").is_none());
    }

    #[test]
    fn malformed_payload_is_a_provider_error() {
        let mut parse = chunk_parser("openai");
        let err = parse("not json").unwrap_err();
        assert!(matches!(err, ChatError::Provider { provider: "openai", .. }));
    }
}
