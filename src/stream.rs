//! Shared server-sent-events plumbing for streaming chat calls.
//!
//! Vendors differ in what their SSE payloads contain but not in the framing,
//! so decoding is split in two: [`SseDecoder`] turns a raw byte stream into
//! `data:` payloads and the `[DONE]` marker, and [`SseChunkStream`] maps each
//! payload through an adapter-supplied parser into [`StreamChunk`]s while
//! guaranteeing that exactly one terminal chunk is yielded per call, whether
//! the vendor signals completion explicitly or the feed simply ends.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_util::StreamExt;

use crate::error::ChatError;
use crate::http::HttpBodyStream;
use crate::types::StreamChunk;

/// Decoded SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseEvent {
    /// Joined `data:` payload of one event.
    Data(String),
    /// The `[DONE]` marker some vendors emit.
    Done,
}

/// Normalizes a raw HTTP body stream into [`SseEvent`] values.
///
/// Handles CRLF line endings, multi-line `data:` payloads, and ignores
/// comment/`event:`/`id:` framing lines.
pub(crate) struct SseDecoder {
    body: HttpBodyStream,
    buffer: Vec<u8>,
    data_lines: Vec<Vec<u8>>,
    pending: VecDeque<Result<SseEvent, ChatError>>,
    provider: &'static str,
    exhausted: bool,
    finished: bool,
}

impl SseDecoder {
    pub(crate) fn new(body: HttpBodyStream, provider: &'static str) -> Self {
        Self {
            body,
            buffer: Vec::new(),
            data_lines: Vec::new(),
            pending: VecDeque::new(),
            provider,
            exhausted: false,
            finished: false,
        }
    }

    fn accept_line(&mut self, line: Vec<u8>) {
        if let Some(rest) = line.strip_prefix(b"data:") {
            let payload = match rest.first() {
                Some(b' ') => rest[1..].to_vec(),
                _ => rest.to_vec(),
            };
            self.data_lines.push(payload);
        }
        // event:, id:, retry:, and comment lines carry no payload we use.
    }

    fn flush_event(&mut self) {
        if self.data_lines.is_empty() {
            return;
        }
        let mut joined = Vec::new();
        for (idx, mut segment) in self.data_lines.drain(..).enumerate() {
            if idx > 0 {
                joined.push(b'\n');
            }
            joined.append(&mut segment);
        }
        match String::from_utf8(joined) {
            Ok(data) if data.trim() == "[DONE]" => {
                self.pending.push_back(Ok(SseEvent::Done));
            }
            Ok(data) => self.pending.push_back(Ok(SseEvent::Data(data))),
            Err(err) => self.pending.push_back(Err(ChatError::provider(
                self.provider,
                format!("invalid UTF-8 in stream event: {err}"),
            ))),
        }
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.buffer.iter().position(|b| *b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(line)
    }
}

impl Stream for SseDecoder {
    type Item = Result<SseEvent, ChatError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(event));
            }
            if this.finished {
                return Poll::Ready(None);
            }
            if this.exhausted {
                // Flush whatever the feed left behind without a trailing blank line.
                if !this.buffer.is_empty() {
                    let line: Vec<u8> = this.buffer.drain(..).collect();
                    this.accept_line(line);
                }
                this.flush_event();
                this.finished = true;
                continue;
            }
            match this.body.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.buffer.extend_from_slice(&bytes);
                    while let Some(line) = this.take_line() {
                        if line.is_empty() {
                            this.flush_event();
                        } else {
                            this.accept_line(line);
                        }
                    }
                }
                Poll::Ready(Some(Err(err))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => this.exhausted = true,
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Adapter-supplied mapping from one SSE payload to at most one chunk.
///
/// Stateful closures are allowed; the Anthropic adapter remembers the stop
/// reason announced before its terminal event.
pub(crate) type ChunkParser =
    Box<dyn FnMut(&str) -> Result<Option<StreamChunk>, ChatError> + Send>;

/// Maps decoded SSE payloads into [`StreamChunk`]s with a single-terminal
/// guarantee.
///
/// A chunk marked final by the parser ends the logical stream; later finals
/// are suppressed. If the feed ends (via `[DONE]` or exhaustion) before any
/// final chunk was produced, one is synthesized with `synthetic_reason`.
pub(crate) struct SseChunkStream {
    decoder: SseDecoder,
    parse: ChunkParser,
    synthetic_reason: Option<&'static str>,
    terminal_sent: bool,
    finished: bool,
}

impl SseChunkStream {
    pub(crate) fn new(
        body: HttpBodyStream,
        provider: &'static str,
        parse: ChunkParser,
        synthetic_reason: Option<&'static str>,
    ) -> Self {
        Self {
            decoder: SseDecoder::new(body, provider),
            parse,
            synthetic_reason,
            terminal_sent: false,
            finished: false,
        }
    }
}

impl Stream for SseChunkStream {
    type Item = Result<StreamChunk, ChatError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        loop {
            match Pin::new(&mut this.decoder).poll_next(cx) {
                Poll::Ready(Some(Ok(SseEvent::Data(data)))) => match (this.parse)(&data) {
                    Ok(Some(chunk)) => {
                        if chunk.is_final {
                            if this.terminal_sent {
                                continue;
                            }
                            this.terminal_sent = true;
                        }
                        return Poll::Ready(Some(Ok(chunk)));
                    }
                    Ok(None) => continue,
                    Err(err) => {
                        this.finished = true;
                        return Poll::Ready(Some(Err(err)));
                    }
                },
                Poll::Ready(Some(Ok(SseEvent::Done))) | Poll::Ready(None) => {
                    this.finished = true;
                    if !this.terminal_sent {
                        this.terminal_sent = true;
                        return Poll::Ready(Some(Ok(StreamChunk::terminal(
                            this.synthetic_reason.map(str::to_string),
                        ))));
                    }
                    return Poll::Ready(None);
                }
                Poll::Ready(Some(Err(err))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Buffers an entire stream body, used to surface error payloads from
/// streaming endpoints that failed before producing events.
pub(crate) async fn collect_stream_text(
    mut body: HttpBodyStream,
    provider: &'static str,
) -> Result<String, ChatError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = body.next().await {
        bytes.extend_from_slice(&chunk?);
    }
    String::from_utf8(bytes).map_err(|err| {
        ChatError::provider(provider, format!("failed to decode stream error body: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use futures_util::stream;

    use super::*;

    fn body_from(chunks: Vec<&[u8]>) -> HttpBodyStream {
        let owned: Vec<Result<Vec<u8>, ChatError>> =
            chunks.into_iter().map(|c| Ok(c.to_vec())).collect();
        Box::pin(stream::iter(owned))
    }

    #[tokio::test]
    async fn decoder_emits_data_then_done() {
        let mut decoder = SseDecoder::new(
            body_from(vec![b"data: {\"text\":\"hi\"}\n\n", b"data: [DONE]\n\n"]),
            "test",
        );
        assert_eq!(
            decoder.next().await.unwrap().unwrap(),
            SseEvent::Data("{\"text\":\"hi\"}".to_string())
        );
        assert_eq!(decoder.next().await.unwrap().unwrap(), SseEvent::Done);
        assert!(decoder.next().await.is_none());
    }

    #[tokio::test]
    async fn decoder_joins_multiline_payloads_and_handles_crlf() {
        let mut decoder = SseDecoder::new(
            body_from(vec![b"data: line one\r\ndata: line two\r\n\r\n"]),
            "test",
        );
        assert_eq!(
            decoder.next().await.unwrap().unwrap(),
            SseEvent::Data("line one\nline two".to_string())
        );
    }

    #[tokio::test]
    async fn decoder_ignores_event_and_comment_lines() {
        let mut decoder = SseDecoder::new(
            body_from(vec![b": keepalive\nevent: message_start\ndata: payload\n\n"]),
            "test",
        );
        assert_eq!(
            decoder.next().await.unwrap().unwrap(),
            SseEvent::Data("payload".to_string())
        );
    }

    #[tokio::test]
    async fn decoder_flushes_trailing_event_on_exhaustion() {
        let mut decoder = SseDecoder::new(body_from(vec![b"data: tail"]), "test");
        assert_eq!(
            decoder.next().await.unwrap().unwrap(),
            SseEvent::Data("tail".to_string())
        );
        assert!(decoder.next().await.is_none());
    }

    #[tokio::test]
    async fn decoder_reports_invalid_utf8() {
        let mut decoder = SseDecoder::new(body_from(vec![b"data: \xff\n\n"]), "broken");
        let err = decoder.next().await.unwrap().unwrap_err();
        assert!(matches!(err, ChatError::Provider { provider: "broken", .. }));
    }

    fn passthrough_parser() -> ChunkParser {
        Box::new(|data: &str| {
            if data == "finish" {
                Ok(Some(StreamChunk {
                    content: String::new(),
                    finish_reason: Some("stop".to_string()),
                    is_final: true,
                }))
            } else if data.is_empty() {
                Ok(None)
            } else {
                Ok(Some(StreamChunk::delta(data)))
            }
        })
    }

    #[tokio::test]
    async fn chunk_stream_yields_single_terminal_despite_done_marker() {
        let body = body_from(vec![
            b"data: a\n\n",
            b"data: b\n\n",
            b"data: finish\n\n",
            b"data: [DONE]\n\n",
        ]);
        let chunks: Vec<StreamChunk> = SseChunkStream::new(body, "test", passthrough_parser(), None)
            .map(|c| c.unwrap())
            .collect()
            .await;
        assert_eq!(chunks.len(), 3);
        assert!(!chunks[0].is_final);
        assert!(!chunks[1].is_final);
        assert!(chunks[2].is_final);
        assert_eq!(chunks[2].finish_reason.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn chunk_stream_synthesizes_terminal_on_exhaustion() {
        let body = body_from(vec![b"data: a\n\n"]);
        let chunks: Vec<StreamChunk> =
            SseChunkStream::new(body, "test", passthrough_parser(), Some("stop"))
                .map(|c| c.unwrap())
                .collect()
                .await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "a");
        assert!(chunks[1].is_final);
        assert_eq!(chunks[1].finish_reason.as_deref(), Some("stop"));
        assert!(chunks[1].content.is_empty());
    }

    #[tokio::test]
    async fn chunk_stream_synthesizes_terminal_on_bare_done() {
        let body = body_from(vec![b"data: [DONE]\n\n"]);
        let chunks: Vec<StreamChunk> =
            SseChunkStream::new(body, "test", passthrough_parser(), None)
                .map(|c| c.unwrap())
                .collect()
                .await;
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_final);
        assert!(chunks[0].finish_reason.is_none());
    }
}
