use crate::types::{ChatResponse, Usage};

use super::types::GenerateContentResponse;

/// Normalizes a GenerateContent payload into the canonical response shape.
///
/// `requested_model` backs the model field when the payload omits its own
/// model version. Finish reasons arrive upper-cased (`STOP`) and are
/// normalized to lowercase.
pub(crate) fn map_response(
    payload: GenerateContentResponse,
    requested_model: &str,
) -> ChatResponse {
    let raw = serde_json::to_value(&payload).ok();
    let candidate = payload.candidates.first();
    let content: String = candidate
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect()
        })
        .unwrap_or_default();
    let finish_reason = candidate
        .and_then(|c| c.finish_reason.as_ref())
        .map(|reason| reason.to_ascii_lowercase());
    let usage = payload.usage_metadata.as_ref().map(|u| Usage {
        prompt_tokens: u.prompt_token_count,
        completion_tokens: u.candidates_token_count,
        total_tokens: u.total_token_count,
    });
    let model = payload
        .model_version
        .clone()
        .unwrap_or_else(|| requested_model.to_string());
    ChatResponse {
        content,
        model,
        usage,
        finish_reason,
        raw_response: raw,
    }
}
