use serde_json::Value;
use thiserror::Error;

/// Aggregates every failure mode exposed by the unified client.
///
/// Adapters classify each transport-layer failure into exactly one of
/// [`ChatError::Authentication`], [`ChatError::RateLimit`], or
/// [`ChatError::Api`] before it crosses the provider boundary, so callers
/// never see vendor-native error types. [`ChatError::Configuration`] is only
/// raised at construction or switch time, never mid-conversation.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Invalid or missing settings, or an unknown provider name.
    #[error("configuration error: {message}")]
    Configuration { message: String },
    /// Provider-identified failure with no finer classification, such as an
    /// unparseable success payload.
    #[error("[{provider}] {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },
    /// API call failure, including connection-level errors (no status).
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status, when a response was received.
        status: Option<u16>,
        /// Raw vendor error payload for diagnostics.
        response: Option<Value>,
    },
    /// The vendor rejected the credential.
    #[error("authentication failed: {message}")]
    Authentication {
        message: String,
        status: Option<u16>,
        response: Option<Value>,
    },
    /// The vendor throttled the request.
    #[error("rate limited: {message}")]
    RateLimit {
        message: String,
        status: Option<u16>,
        response: Option<Value>,
    },
}

impl ChatError {
    /// Creates a [`ChatError::Configuration`] from a textual description.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a [`ChatError::Provider`] with the given provider name.
    pub fn provider(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Provider {
            provider,
            message: message.into(),
        }
    }

    /// Creates a status-less [`ChatError::Api`], the shape used for
    /// connection-level transport failures.
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            status: None,
            response: None,
        }
    }

    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. }
            | Self::Authentication { status, .. }
            | Self::RateLimit { status, .. } => *status,
            _ => None,
        }
    }

    /// Raw vendor error payload attached to the error, if any.
    pub fn response(&self) -> Option<&Value> {
        match self {
            Self::Api { response, .. }
            | Self::Authentication { response, .. }
            | Self::RateLimit { response, .. } => response.as_ref(),
            _ => None,
        }
    }
}
