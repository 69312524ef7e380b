//! Process-wide name-to-constructor registry enabling runtime provider
//! selection and switching.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::config::ProviderConfig;
use crate::error::ChatError;
use crate::http::DynHttpTransport;

use super::DynProvider;
use super::anthropic::AnthropicProvider;
use super::gemini::GeminiProvider;
use super::openai_compat::OpenAiCompatProvider;

/// Constructor closure stored per provider name.
pub type ProviderFactory =
    Arc<dyn Fn(ProviderConfig, DynHttpTransport) -> Result<DynProvider, ChatError> + Send + Sync>;

static REGISTRY: OnceLock<RwLock<HashMap<String, ProviderFactory>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<String, ProviderFactory>> {
    // Built-in vendors are seeded here, on first access, rather than through
    // scattered registration side effects.
    REGISTRY.get_or_init(|| RwLock::new(builtin_factories()))
}

fn builtin_factories() -> HashMap<String, ProviderFactory> {
    let mut factories: HashMap<String, ProviderFactory> = HashMap::new();
    factories.insert(
        "openai".to_string(),
        Arc::new(|config, transport| {
            Ok(Arc::new(OpenAiCompatProvider::openai(config, transport)?) as DynProvider)
        }),
    );
    factories.insert(
        "deepseek".to_string(),
        Arc::new(|config, transport| {
            Ok(Arc::new(OpenAiCompatProvider::deepseek(config, transport)?) as DynProvider)
        }),
    );
    factories.insert(
        "anthropic".to_string(),
        Arc::new(|config, transport| {
            Ok(Arc::new(AnthropicProvider::new(config, transport)?) as DynProvider)
        }),
    );
    factories.insert(
        "gemini".to_string(),
        Arc::new(|config, transport| {
            Ok(Arc::new(GeminiProvider::new(config, transport)?) as DynProvider)
        }),
    );
    factories
}

/// Looks up a constructor by case-insensitive name.
///
/// # Errors
///
/// Returns [`ChatError::Configuration`] naming the attempted provider and
/// listing the known set.
pub fn lookup(name: &str) -> Result<ProviderFactory, ChatError> {
    let guard = registry().read().unwrap_or_else(|err| err.into_inner());
    if let Some(factory) = guard.get(&name.to_ascii_lowercase()) {
        return Ok(factory.clone());
    }
    let mut known: Vec<&str> = guard.keys().map(String::as_str).collect();
    known.sort_unstable();
    Err(ChatError::configuration(format!(
        "unknown provider: {name}. known providers: {}",
        known.join(", ")
    )))
}

/// Inserts or overwrites a provider constructor. Last registration for a
/// given name wins.
pub fn register(name: impl Into<String>, factory: ProviderFactory) {
    registry()
        .write()
        .unwrap_or_else(|err| err.into_inner())
        .insert(name.into().to_ascii_lowercase(), factory);
}

/// Sorted list of currently registered provider names.
pub fn known_providers() -> Vec<String> {
    let guard = registry().read().unwrap_or_else(|err| err.into_inner());
    let mut known: Vec<String> = guard.keys().cloned().collect();
    known.sort_unstable();
    known
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert!(lookup("OpenAI").is_ok());
        assert!(lookup("GEMINI").is_ok());
    }

    #[test]
    fn lookup_unknown_names_attempt_and_known_set() {
        let err = match lookup("nonexistent") {
            Err(e) => e,
            Ok(_) => panic!("called `Result::unwrap_err()` on an `Ok` value"),
        };
        match err {
            ChatError::Configuration { message } => {
                assert!(message.contains("nonexistent"));
                assert!(message.contains("openai"));
                assert!(message.contains("deepseek"));
                assert!(message.contains("anthropic"));
                assert!(message.contains("gemini"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn register_overwrites_and_last_wins() {
        let first: ProviderFactory = Arc::new(|config, transport| {
            Ok(Arc::new(OpenAiCompatProvider::openai(config, transport)?) as DynProvider)
        });
        let second: ProviderFactory = Arc::new(|config, transport| {
            Ok(Arc::new(OpenAiCompatProvider::deepseek(config, transport)?) as DynProvider)
        });
        register("Registry-Test-Vendor", first);
        register("registry-test-vendor", second.clone());
        let resolved = lookup("registry-test-vendor").expect("registered");
        assert!(Arc::ptr_eq(&resolved, &second));
        assert!(known_providers().contains(&"registry-test-vendor".to_string()));
    }
}
