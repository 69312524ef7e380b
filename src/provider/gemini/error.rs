use serde::Deserialize;
use serde_json::Value;

use crate::error::ChatError;

/// Classifies a non-2xx GenerateContent response into the error taxonomy.
///
/// Google pairs HTTP statuses with RPC status strings (`UNAUTHENTICATED`,
/// `RESOURCE_EXHAUSTED`); the string is folded into the message for
/// diagnostics while classification follows the HTTP status.
pub(crate) fn classify_status(status: u16, body: &str) -> ChatError {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<InnerError>,
    }
    #[derive(Deserialize)]
    struct InnerError {
        message: Option<String>,
        status: Option<String>,
    }

    let raw: Option<Value> = serde_json::from_str(body).ok();
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .map(|error| {
            let message = error
                .message
                .unwrap_or_else(|| "unknown error".to_string());
            match error.status {
                Some(rpc) if !rpc.is_empty() => format!("{message} ({rpc})"),
                _ => message,
            }
        })
        .unwrap_or_else(|| format!("gemini request failed with status {status}: {body}"));

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
