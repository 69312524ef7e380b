use serde::Deserialize;
use serde_json::Value;

use crate::error::ChatError;

/// Classifies a non-2xx chat-completions response into the error taxonomy.
///
/// Auth rejections (401/403) and throttling (429) get their own variants;
/// everything else is an API error carrying the status and raw payload.
pub(crate) fn classify_status(provider: &'static str, status: u16, body: &str) -> ChatError {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<InnerError>,
    }
    #[derive(Deserialize)]
    struct InnerError {
        message: Option<String>,
        code: Option<Value>,
    }

    let raw: Option<Value> = serde_json::from_str(body).ok();
    let message = raw
        .as_ref()
        .and_then(|_| serde_json::from_str::<ErrorBody>(body).ok())
        .and_then(|parsed| parsed.error)
        .map(|error| {
            let mut message = error
                .message
                .unwrap_or_else(|| "unknown error".to_string());
            if let Some(code) = error.code {
                message = format!("{message} ({code})");
            }
            message
        })
        .unwrap_or_else(|| format!("{provider} request failed with status {status}: {body}"));

    match status {
        401 | 403 => ChatError::Authentication {
            message,
            status: Some(status),
            response: raw,
        },
        429 => ChatError::RateLimit {
            message,
            status: Some(status),
            response: raw,
        },
        _ => ChatError::Api {
            message,
            status: Some(status),
            response: raw,
        },
    }
}
