use serde::Deserialize;
use serde_json::Value;

use crate::error::ChatError;

/// Classifies a non-2xx Messages API response into the error taxonomy.
pub(crate) fn classify_status(status: u16, body: &str) -> ChatError {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<InnerError>,
    }
    #[derive(Deserialize)]
    struct InnerError {
        #[serde(rename = "type")]
        kind: Option<String>,
        message: Option<String>,
    }

    let raw: Option<Value> = serde_json::from_str(body).ok();
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .map(|error| {
            let message = error
                .message
                .unwrap_or_else(|| "unknown error".to_string());
            match error.kind {
                Some(kind) if !kind.is_empty() => format!("{message} ({kind})"),
                _ => message,
            }
        })
        .unwrap_or_else(|| format!("anthropic request failed with status {status}: {body}"));

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
