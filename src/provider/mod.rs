//! The capability contract every vendor adapter implements, plus the shared
//! message-to-wire preparation.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_core::Stream;

use crate::config::ProviderConfig;
use crate::error::ChatError;
use crate::types::{ChatResponse, Message, StreamChunk};

pub mod anthropic;
pub mod gemini;
pub mod openai_compat;
pub mod registry;

/// Pull stream of normalized chunks produced by a streaming chat call.
///
/// Each `next` step may suspend on network I/O. Adapters guarantee exactly
/// one chunk with `is_final` set per call; the stream is not restartable.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, ChatError>> + Send>>;

/// Vendor adapter contract.
///
/// Client initialization happens in each adapter's constructor: vendor
/// defaults are resolved and the config validated before an instance exists,
/// so missing or malformed settings surface as [`ChatError::Configuration`]
/// at construction time, never on the first call. A failed construction
/// leaves nothing behind to retry; the facade builds a replacement instead.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Registry name of this adapter.
    fn name(&self) -> &'static str;

    /// Resolved configuration the adapter was built with.
    fn config(&self) -> &ProviderConfig;

    /// Effective model identifier after default resolution.
    fn model(&self) -> &str {
        &self.config().model
    }

    /// Effective endpoint URL for non-streaming calls.
    fn endpoint(&self) -> String;

    /// Single round-trip chat call over the given context.
    ///
    /// # Errors
    ///
    /// Every transport failure is classified into one of
    /// [`ChatError::Authentication`], [`ChatError::RateLimit`], or
    /// [`ChatError::Api`]; unparseable success payloads surface as
    /// [`ChatError::Provider`].
    async fn chat(&self, messages: &[Message]) -> Result<ChatResponse, ChatError>;

    /// Streaming variant of [`Provider::chat`].
    async fn stream_chat(&self, messages: &[Message]) -> Result<ChunkStream, ChatError>;
}

/// Thread-safe provider handle.
pub type DynProvider = Arc<dyn Provider>;

/// Shared message-to-wire preparation.
///
/// If a system directive is configured it is emitted first as a system-role
/// entry, followed by the conversation messages in original order. Vendor
/// transports that need a different physical shape (Gemini's flattened
/// prompt, Anthropic's top-level system field) transform the output of this
/// function; they never reorder it.
pub fn prepare_messages(system_prompt: Option<&str>, messages: &[Message]) -> Vec<Message> {
    let mut prepared = Vec::with_capacity(messages.len() + 1);
    if let Some(prompt) = system_prompt {
        prepared.push(Message::system(prompt));
    }
    prepared.extend(messages.iter().cloned());
    prepared
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn prepare_messages_puts_directive_first() {
        let history = vec![Message::user("q"), Message::assistant("a")];
        let prepared = prepare_messages(Some("directive"), &history);
        assert_eq!(prepared.len(), 3);
        assert_eq!(prepared[0].role, Role::System);
        assert_eq!(prepared[0].content, "directive");
        assert_eq!(prepared[1].content, "q");
        assert_eq!(prepared[2].content, "a");
    }

    #[test]
    fn prepare_messages_without_directive_is_identity() {
        let history = vec![Message::user("q")];
        assert_eq!(prepare_messages(None, &history), history);
    }
}
