//! Provider configuration and the default-merging step that runs before any
//! provider is constructed.

use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::error::ChatError;

/// Wrapper for the vendor credential.
///
/// Redacts itself in `Debug`/`Display` output and serializes as a
/// placeholder, so the key never lands in logs or exported data. Use
/// [`Secret::expose`] only at the point the value is written into a request
/// header.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Plaintext credential. Handle with care.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("••••••")
    }
}

impl Serialize for Secret {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("[REDACTED]")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Settings shared by every provider.
///
/// An empty `model` means "use the vendor's default model"; the gap is
/// filled by [`VendorDefaults`] when the provider is constructed. Range
/// validation runs before any provider object exists, so an adapter never
/// holds an out-of-range config.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: Secret,
    /// Model identifier; empty selects the vendor default.
    pub model: String,
    /// Endpoint override; `None` selects the vendor default.
    pub base_url: Option<String>,
    /// Per-request timeout. Must be at least one second.
    pub timeout: Duration,
    /// Connection retries delegated to the transport layer.
    pub max_retries: u32,
    /// Sampling temperature within `0.0..=2.0`.
    pub temperature: f32,
    /// Response token cap; some vendor families force a value here.
    pub max_tokens: Option<u32>,
    /// System directive emitted first in every request.
    pub system_prompt: Option<String>,
}

impl ProviderConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const DEFAULT_TEMPERATURE: f32 = 1.0;

    pub fn new(api_key: impl Into<Secret>) -> Self {
        Self {
            api_key: api_key.into(),
            model: String::new(),
            base_url: None,
            timeout: Self::DEFAULT_TIMEOUT,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            temperature: Self::DEFAULT_TEMPERATURE,
            max_tokens: None,
            system_prompt: None,
        }
    }

    /// Rejects out-of-range settings.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Configuration`] naming the offending field.
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.timeout < Duration::from_secs(1) {
            return Err(ChatError::configuration(format!(
                "timeout must be at least 1 second, got {:?}",
                self.timeout
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ChatError::configuration(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == Some(0) {
            return Err(ChatError::configuration(
                "max_tokens must be at least 1 when set",
            ));
        }
        Ok(())
    }

    /// Layers vendor defaults underneath caller-supplied values and
    /// validates the result.
    ///
    /// Precedence is fixed: explicit caller value, then vendor default, then
    /// the base default. Runs on every provider construction, including
    /// switches, so an empty model always re-resolves against the new
    /// vendor's table.
    pub(crate) fn resolve(mut self, defaults: &VendorDefaults) -> Result<Self, ChatError> {
        if self.api_key.expose().trim().is_empty() {
            return Err(ChatError::configuration("api key is required"));
        }
        if self.model.trim().is_empty() {
            self.model = defaults.model.to_string();
        }
        if self.base_url.is_none() {
            self.base_url = Some(defaults.base_url.to_string());
        }
        if let Some(required) = defaults.require_max_tokens {
            // This vendor family rejects requests without a token cap.
            self.max_tokens = Some(self.max_tokens.unwrap_or(required));
        }
        self.validate()?;
        Ok(self)
    }
}

/// Per-vendor default table merged by [`ProviderConfig::resolve`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct VendorDefaults {
    pub(crate) model: &'static str,
    pub(crate) base_url: &'static str,
    /// Forced token cap for vendors that require one.
    pub(crate) require_max_tokens: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: VendorDefaults = VendorDefaults {
        model: "vendor-default-model",
        base_url: "https://vendor.example/v1",
        require_max_tokens: None,
    };

    const CAPPED: VendorDefaults = VendorDefaults {
        model: "capped-model",
        base_url: "https://capped.example",
        require_max_tokens: Some(4096),
    };

    #[test]
    fn secret_never_prints_plaintext() {
        let secret = Secret::new("sk-very-secret");
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(format!("{secret}"), "••••••");
        let json = serde_json::to_string(&secret).expect("serialize");
        assert!(!json.contains("sk-very-secret"));
    }

    #[test]
    fn config_debug_never_prints_plaintext() {
        let config = ProviderConfig::new("sk-very-secret");
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-very-secret"));
    }

    #[test]
    fn empty_model_falls_back_to_vendor_default() {
        let config = ProviderConfig::new("key").resolve(&DEFAULTS).expect("resolve");
        assert_eq!(config.model, "vendor-default-model");
        assert_eq!(config.base_url.as_deref(), Some("https://vendor.example/v1"));
    }

    #[test]
    fn caller_values_win_over_vendor_defaults() {
        let mut config = ProviderConfig::new("key");
        config.model = "my-model".to_string();
        config.base_url = Some("https://proxy.example".to_string());
        let config = config.resolve(&DEFAULTS).expect("resolve");
        assert_eq!(config.model, "my-model");
        assert_eq!(config.base_url.as_deref(), Some("https://proxy.example"));
    }

    #[test]
    fn capped_vendor_forces_max_tokens_only_when_unset() {
        let config = ProviderConfig::new("key").resolve(&CAPPED).expect("resolve");
        assert_eq!(config.max_tokens, Some(4096));

        let mut config = ProviderConfig::new("key");
        config.max_tokens = Some(100);
        let config = config.resolve(&CAPPED).expect("resolve");
        assert_eq!(config.max_tokens, Some(100));
    }

    #[test]
    fn resolve_rejects_missing_api_key() {
        let err = ProviderConfig::new("  ").resolve(&DEFAULTS).unwrap_err();
        assert!(matches!(err, ChatError::Configuration { .. }));
    }

    #[test]
    fn validate_rejects_out_of_range_fields() {
        let mut config = ProviderConfig::new("key");
        config.temperature = 2.5;
        assert!(config.validate().is_err());

        let mut config = ProviderConfig::new("key");
        config.timeout = Duration::from_millis(500);
        assert!(config.validate().is_err());

        let mut config = ProviderConfig::new("key");
        config.max_tokens = Some(0);
        assert!(config.validate().is_err());
    }
}
