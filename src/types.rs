//! Canonical value types shared across providers.
//!
//! Every vendor adapter maps its own wire payloads into these shapes so the
//! rest of the crate never sees provider-specific structures.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a message within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire-format spelling of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversation message.
///
/// Serializes as `{"role": "...", "content": "..."}`, which is also the
/// exported history format of [`crate::client::Switchboard::history`].
///
/// # Examples
///
/// ```
/// # use switchboard::types::{Message, Role};
/// let msg = Message::user("hello");
/// assert_eq!(msg.role, Role::User);
/// assert_eq!(serde_json::to_value(&msg).unwrap()["role"], "user");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Token accounting reported by a vendor.
///
/// The zero default is only the type's own default; adapters never fabricate
/// a `Usage` from a response that reported nothing (they return `None`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Normalized reply from a non-streaming chat call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Assistant text, empty when the vendor returned no content.
    pub content: String,
    /// Model identifier the vendor reports having served the request with.
    pub model: String,
    /// Token usage, when the vendor reported it.
    pub usage: Option<Usage>,
    /// Vendor finish reason, normalized to lowercase where applicable.
    pub finish_reason: Option<String>,
    /// Raw vendor payload for diagnostics. Excluded from serialization.
    #[serde(skip)]
    pub raw_response: Option<Value>,
}

impl fmt::Display for ChatResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

/// One increment of a streaming chat call.
///
/// Adapters yield a finite sequence of chunks ending in exactly one chunk
/// with `is_final` set; the sequence is not restartable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Text fragment, possibly empty (terminal chunks usually carry none).
    pub content: String,
    /// Finish reason, present once the vendor signals completion.
    pub finish_reason: Option<String>,
    /// Marks the last chunk of the stream.
    pub is_final: bool,
}

impl StreamChunk {
    /// Non-terminal content fragment.
    pub(crate) fn delta(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            finish_reason: None,
            is_final: false,
        }
    }

    /// Terminal chunk carrying no further content.
    pub(crate) fn terminal(finish_reason: Option<String>) -> Self {
        Self {
            content: String::new(),
            finish_reason,
            is_final: true,
        }
    }
}

impl fmt::Display for StreamChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}
