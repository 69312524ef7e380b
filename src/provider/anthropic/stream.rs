use crate::error::ChatError;
use crate::stream::ChunkParser;
use crate::types::StreamChunk;

use super::types::StreamEvent;

/// Maps one Messages API SSE payload to at most one chunk.
///
/// The protocol splits completion across two events: `message_delta`
/// announces the stop reason, `message_stop` ends the stream. The parser
/// remembers the announced reason and attaches it to the terminal chunk it
/// emits on `message_stop`.
pub(crate) fn chunk_parser() -> ChunkParser {
    let mut stop_reason: Option<String> = None;
    Box::new(move |data: &str| {
        let event: StreamEvent = serde_json::from_str(data).map_err(|err| {
            ChatError::provider("anthropic", format!("failed to parse stream event: {err}"))
        })?;
        match event.kind.as_str() {
            "content_block_delta" => {
                let text = event.delta.and_then(|d| d.text).unwrap_or_default();
                if text.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(StreamChunk::delta(text)))
                }
            }
            "message_delta" => {
                if let Some(reason) = event.delta.and_then(|d| d.stop_reason) {
                    stop_reason = Some(reason);
                }
                Ok(None)
            }
            "message_stop" => Ok(Some(StreamChunk::terminal(stop_reason.take()))),
            "error" => {
                let message = event
                    .error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "stream error".to_string());
                Err(ChatError::Api {
                    message,
                    status: None,
                    response: serde_json::from_str(data).ok(),
                })
            }
            // message_start, content_block_start/stop, ping
            _ => Ok(None),
        }
    })
}
