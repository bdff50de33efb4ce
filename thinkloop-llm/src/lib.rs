//! # thinkloop LLM
//!
//! The model call behind the agent, kept opaque: a list of chat messages
//! goes in, text comes out.
//!
//! ## Core Concepts
//! - **Provider**: Trait-based LLM communication (`LlmProvider`)
//! - **Config**: Explicit `ProviderConfig`, never ambient state
//! - **Errors**: `ProviderError` mapped onto `thinkloop_error::Error`

pub mod error;
pub mod provider;

pub use error::{provider_error, Error, ErrorKind, ErrorStatus, Result};
pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
    OpenAIProvider, ProviderConfig, ProviderError, ProviderType, Role, ScriptedProvider, Usage,
    UsageTracker, DEFAULT_MODEL, OPENAI_BASE_URL,
};
