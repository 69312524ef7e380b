//! The user-facing facade tying memory, registry, and providers together.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_core::Stream;

use crate::config::{ProviderConfig, Secret};
use crate::error::ChatError;
use crate::http::{DynHttpTransport, reqwest::default_dyn_transport};
use crate::memory::Memory;
use crate::provider::{ChunkStream, DynProvider, registry};
use crate::types::{ChatResponse, Message};

/// Unified chat client with automatic context management.
///
/// Owns exactly one active provider and one [`Memory`]; switching providers
/// replaces the provider reference and, by default, preserves the memory.
/// All conversational methods take `&mut self`, so one facade serves one
/// logical conversation at a time.
///
/// # Examples
///
/// ```no_run
/// # use switchboard::Switchboard;
/// # use futures_util::StreamExt;
/// # async fn demo() -> Result<(), switchboard::ChatError> {
/// let mut bot = Switchboard::builder("openai", "sk-...")
///     .system_prompt("You are concise.")
///     .build()?;
///
/// let reply = bot.chat("Hello, who are you?").await?;
/// println!("{reply}");
///
/// let mut stream = bot.stream("Tell me a story").await?;
/// while let Some(fragment) = stream.next().await {
///     print!("{}", fragment?);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Switchboard {
    provider_name: String,
    provider: DynProvider,
    memory: Memory,
    transport: DynHttpTransport,
}

impl std::fmt::Debug for Switchboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Switchboard")
            .field("provider_name", &self.provider_name)
            .field("memory", &self.memory)
            .finish_non_exhaustive()
    }
}

impl Switchboard {
    /// Starts building a client for the named provider.
    pub fn builder(
        provider: impl Into<String>,
        api_key: impl Into<Secret>,
    ) -> SwitchboardBuilder {
        SwitchboardBuilder {
            provider: provider.into(),
            api_key: api_key.into(),
            model: None,
            base_url: None,
            system_prompt: None,
            temperature: ProviderConfig::DEFAULT_TEMPERATURE,
            max_tokens: None,
            max_history: None,
            timeout: ProviderConfig::DEFAULT_TIMEOUT,
            max_retries: ProviderConfig::DEFAULT_MAX_RETRIES,
            transport: None,
        }
    }

    /// Name of the active provider.
    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    /// Effective model of the active provider.
    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Active provider handle, mostly useful for inspecting its config.
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Sends a message and returns the assistant's reply text.
    ///
    /// The user message is recorded before the provider call; on failure it
    /// stays recorded. There is no rollback; use [`Memory::pop_last`] to
    /// undo manually.
    pub async fn chat(&mut self, message: impl Into<String>) -> Result<String, ChatError> {
        Ok(self.chat_full(message).await?.content)
    }

    /// Like [`Switchboard::chat`] but returns the full response object.
    pub async fn chat_full(
        &mut self,
        message: impl Into<String>,
    ) -> Result<ChatResponse, ChatError> {
        self.memory.add_user(message);
        tracing::debug!(
            provider = %self.provider_name,
            model = %self.model(),
            history = self.memory.len(),
            "chat turn"
        );
        let response = self.provider.chat(&self.memory.messages()).await?;
        self.memory.add_assistant(response.content.clone());
        Ok(response)
    }

    /// Sends a message and streams the reply as text fragments.
    ///
    /// Non-empty fragments are accumulated; when the terminal chunk arrives
    /// their concatenation is appended to memory as one assistant message.
    /// A provider failure mid-stream, or abandoning the iteration, appends
    /// nothing.
    pub async fn stream(
        &mut self,
        message: impl Into<String>,
    ) -> Result<TextStream<'_>, ChatError> {
        self.memory.add_user(message);
        tracing::debug!(
            provider = %self.provider_name,
            model = %self.model(),
            history = self.memory.len(),
            "stream turn"
        );
        let inner = self.provider.stream_chat(&self.memory.messages()).await?;
        Ok(TextStream {
            memory: &mut self.memory,
            inner,
            collected: String::new(),
            finished: false,
        })
    }

    /// Replaces the active provider.
    ///
    /// Unset switch fields default to the previous provider's settings (and
    /// the memory's directive), so sampling knobs survive a vendor change
    /// unless explicitly overridden. Memory is preserved unless the switch
    /// disables `keep_history`.
    pub fn switch_provider(&mut self, switch: ProviderSwitch) -> Result<(), ChatError> {
        let previous = self.provider.config().clone();
        let config = ProviderConfig {
            api_key: switch.api_key,
            model: switch.model.unwrap_or_default(),
            base_url: switch.base_url,
            timeout: switch.timeout.unwrap_or(previous.timeout),
            max_retries: switch.max_retries.unwrap_or(previous.max_retries),
            temperature: switch.temperature.unwrap_or(previous.temperature),
            max_tokens: switch.max_tokens.or(previous.max_tokens),
            system_prompt: switch
                .system_prompt
                .or_else(|| self.memory.system_prompt().map(str::to_string)),
        };

        let name = switch.provider.to_ascii_lowercase();
        let factory = registry::lookup(&name)?;
        let provider = factory(config, self.transport.clone())?;
        tracing::debug!(from = %self.provider_name, to = %name, keep_history = switch.keep_history, "provider switch");
        self.provider = provider;
        self.provider_name = name;
        if !switch.keep_history {
            self.memory.clear();
        }
        Ok(())
    }

    /// Clears the conversation history. The directive is retained.
    pub fn clear_history(&mut self) {
        self.memory.clear();
    }

    /// Serializable view of the conversation: ordered `{role, content}`
    /// pairs.
    pub fn history(&self) -> Vec<Message> {
        self.memory.messages()
    }
}

/// Builder for [`Switchboard`].
pub struct SwitchboardBuilder {
    provider: String,
    api_key: Secret,
    model: Option<String>,
    base_url: Option<String>,
    system_prompt: Option<String>,
    temperature: f32,
    max_tokens: Option<u32>,
    max_history: Option<usize>,
    timeout: Duration,
    max_retries: u32,
    transport: Option<DynHttpTransport>,
}

impl SwitchboardBuilder {
    /// Model identifier; the vendor default is used when omitted.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Endpoint override for proxies and compatibility layers.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// System directive prepended to every request.
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Bound on retained conversation messages (directive excluded).
    pub fn max_history(mut self, max_history: usize) -> Self {
        self.max_history = Some(max_history);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Custom transport, mainly for tests and instrumentation.
    pub fn transport(mut self, transport: DynHttpTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Resolves the provider through the registry and constructs the client.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Configuration`] for an unknown provider name or
    /// invalid settings.
    pub fn build(self) -> Result<Switchboard, ChatError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => default_dyn_transport()?,
        };
        let name = self.provider.to_ascii_lowercase();
        let config = ProviderConfig {
            api_key: self.api_key,
            model: self.model.unwrap_or_default(),
            base_url: self.base_url,
            timeout: self.timeout,
            max_retries: self.max_retries,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            system_prompt: self.system_prompt.clone(),
        };
        let factory = registry::lookup(&name)?;
        let provider = factory(config, transport.clone())?;
        Ok(Switchboard {
            provider_name: name,
            provider,
            memory: Memory::new(self.max_history, self.system_prompt),
            transport,
        })
    }
}

/// Request describing a provider switch.
///
/// Fields left unset inherit the previous provider's settings.
#[derive(Debug)]
pub struct ProviderSwitch {
    provider: String,
    api_key: Secret,
    model: Option<String>,
    base_url: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout: Option<Duration>,
    max_retries: Option<u32>,
    system_prompt: Option<String>,
    keep_history: bool,
}

impl ProviderSwitch {
    pub fn new(provider: impl Into<String>, api_key: impl Into<Secret>) -> Self {
        Self {
            provider: provider.into(),
            api_key: api_key.into(),
            model: None,
            base_url: None,
            temperature: None,
            max_tokens: None,
            timeout: None,
            max_retries: None,
            system_prompt: None,
            keep_history: true,
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Whether the conversation survives the switch. Defaults to true.
    pub fn keep_history(mut self, keep: bool) -> Self {
        self.keep_history = keep;
        self
    }
}

/// Text-fragment stream returned by [`Switchboard::stream`].
///
/// Borrows the facade exclusively for its lifetime; the accumulated
/// assistant message is committed to memory when the terminal chunk is
/// observed, and only then.
pub struct TextStream<'a> {
    memory: &'a mut Memory,
    inner: ChunkStream,
    collected: String,
    finished: bool,
}

impl Stream for TextStream<'_> {
    type Item = Result<String, ChatError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        loop {
            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    if !chunk.content.is_empty() {
                        this.collected.push_str(&chunk.content);
                    }
                    if chunk.is_final {
                        this.finished = true;
                        let full = std::mem::take(&mut this.collected);
                        this.memory.add_assistant(full);
                        if chunk.content.is_empty() {
                            return Poll::Ready(None);
                        }
                        return Poll::Ready(Some(Ok(chunk.content)));
                    }
                    if chunk.content.is_empty() {
                        continue;
                    }
                    return Poll::Ready(Some(Ok(chunk.content)));
                }
                Poll::Ready(Some(Err(err))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => {
                    this.finished = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
