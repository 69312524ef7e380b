//! Unified chat interface over multiple LLM vendor APIs.
//!
//! One facade ([`Switchboard`]) drives synchronous chat, streaming chat, and
//! bounded conversation memory against whichever backend vendor is selected,
//! and can switch vendors mid-conversation. Vendor adapters normalize every
//! response and error into the canonical shapes in [`types`] and [`error`].

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod provider;
pub(crate) mod stream;
pub mod types;

pub use client::{ProviderSwitch, Switchboard, SwitchboardBuilder, TextStream};
pub use config::{ProviderConfig, Secret};
pub use error::ChatError;
pub use memory::Memory;
pub use provider::{ChunkStream, DynProvider, Provider};
pub use types::{ChatResponse, Message, Role, StreamChunk, Usage};
