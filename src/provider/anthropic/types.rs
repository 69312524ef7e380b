//! Wire payloads for the Messages API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct MessagesResponse {
    pub(crate) model: String,
    #[serde(default)]
    pub(crate) content: Vec<ContentBlock>,
    #[serde(default)]
    pub(crate) stop_reason: Option<String>,
    #[serde(default)]
    pub(crate) usage: Option<UsagePayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ContentBlock {
    #[serde(rename = "type")]
    pub(crate) kind: String,
    #[serde(default)]
    pub(crate) text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct UsagePayload {
    #[serde(default)]
    pub(crate) input_tokens: u64,
    #[serde(default)]
    pub(crate) output_tokens: u64,
}

/// One SSE event payload; the `type` field discriminates.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StreamEvent {
    #[serde(rename = "type")]
    pub(crate) kind: String,
    #[serde(default)]
    pub(crate) delta: Option<StreamDelta>,
    #[serde(default)]
    pub(crate) error: Option<StreamError>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StreamDelta {
    #[serde(default)]
    pub(crate) text: Option<String>,
    #[serde(default)]
    pub(crate) stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StreamError {
    #[serde(default)]
    pub(crate) message: Option<String>,
}
