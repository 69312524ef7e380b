use crate::error::ChatError;
use crate::stream::ChunkParser;
use crate::types::StreamChunk;

use super::types::GenerateContentResponse;

/// Maps one streamed GenerateContent payload to at most one chunk.
///
/// Every payload is a partial response whose candidate text becomes a
/// non-final fragment. Completion is signaled by the feed ending, at which
/// point the surrounding stream synthesizes the terminal chunk.
pub(crate) fn chunk_parser() -> ChunkParser {
    Box::new(move |data: &str| {
        let payload: GenerateContentResponse = serde_json::from_str(data).map_err(|err| {
            ChatError::provider("gemini", format!("failed to parse stream chunk: {err}"))
        })?;
        let text: String = payload
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect()
            })
            .unwrap_or_default();
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(StreamChunk::delta(text)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_text_becomes_a_non_final_fragment() {
        let mut parse = chunk_parser();
        let data = r#"{"candidates":[{"content":{"parts":[{"text":"partial"}],"role":"model"}}]}"#;
        let chunk = parse(data).expect("parse").expect("chunk");
        assert_eq!(chunk.content, "partial");
        assert!(!chunk.is_final);
        assert!(chunk.finish_reason.is_none());
    }

    #[test]
    fn finish_only_payloads_yield_nothing() {
        let mut parse = chunk_parser();
        let data = r#"{"candidates":[{"finishReason":"STOP"}]}"#;
        assert!(parse(data).expect("parse").is_none());
    }

    #[test]
    fn malformed_payload_is_a_provider_error() {
        let mut parse = chunk_parser();
        assert!(matches!(
            parse("{oops").unwrap_err(),
            ChatError::Provider { provider: "gemini", .. }
        ));
    }
}
