//! # LLM Provider Interface
//!
//! A trait-based abstraction for communicating with chat-completion backends.
//!
//! ## Design
//! - `LlmProvider` trait defines the core interface
//! - `OpenAIProvider` talks to any OpenAI-compatible endpoint
//! - `ScriptedProvider` replays canned replies (tests, offline demo)
//! - Usage tracking across calls

pub mod openai;
pub mod scripted;

pub use openai::OpenAIProvider;
pub use scripted::ScriptedProvider;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

// ============================================================================
// Core Types
// ============================================================================

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Request parameters for a completion
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
    pub stop: Option<Vec<String>>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub id: String,
    pub model: String,
    pub content: Option<String>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Unknown,
}

impl FinishReason {
    pub fn from_api(reason: Option<&str>) -> Self {
        match reason {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Unknown,
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Error type for provider operations
#[derive(Debug)]
pub enum ProviderError {
    /// Network/connection error
    Network(String),
    /// API returned an error
    Api { status: u16, message: String },
    /// Failed to parse response
    Parse(String),
    /// Rate limited
    RateLimited { retry_after: Option<u64> },
    /// Authentication failed
    Unauthenticated,
    /// The model answered without any text
    EmptyResponse,
    /// Other error
    Other(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "Network error: {}", e),
            Self::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            Self::Parse(e) => write!(f, "Parse error: {}", e),
            Self::RateLimited { retry_after } => {
                write!(f, "Rate limited")?;
                if let Some(secs) = retry_after {
                    write!(f, " (retry after {}s)", secs)?;
                }
                Ok(())
            }
            Self::Unauthenticated => write!(f, "Authentication failed"),
            Self::EmptyResponse => write!(f, "No content in response"),
            Self::Other(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ProviderError {}

/// The main LLM provider trait
#[allow(async_fn_in_trait)]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "scripted")
    fn name(&self) -> &str;

    /// Get the default model
    fn default_model(&self) -> &str;

    /// Send a completion request and get a full response
    async fn complete(&self, request: CompletionRequest) -> std::result::Result<CompletionResponse, ProviderError>;

    /// Simple prompt -> response helper
    async fn prompt(&self, prompt: &str) -> std::result::Result<String, ProviderError> {
        self.chat(vec![ChatMessage::user(prompt)]).await
    }

    /// Chat with message history
    async fn chat(&self, messages: Vec<ChatMessage>) -> std::result::Result<String, ProviderError> {
        let request = CompletionRequest::new(messages);
        let response = self.complete(request).await?;
        response.content.ok_or(ProviderError::EmptyResponse)
    }
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for creating providers.
///
/// Nothing here is read implicitly: front ends build a config (possibly via
/// [`ProviderConfig::from_env`]) and hand it to the provider constructor.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    pub headers: HashMap<String, String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    OpenAI,
    Local,
}

impl ProviderConfig {
    pub const API_KEY_VAR: &'static str = "OPENAI_API_KEY";
    pub const BASE_URL_VAR: &'static str = "OPENAI_BASE_URL";
    pub const MODEL_VAR: &'static str = "THINKLOOP_MODEL";
    pub const ORGANIZATION_VAR: &'static str = "OPENAI_ORGANIZATION";
    pub const ORGANIZATION_HEADER: &'static str = "OpenAI-Organization";

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::OpenAI,
            api_key: Some(api_key.into()),
            base_url: Some(OPENAI_BASE_URL.into()),
            default_model: Some(DEFAULT_MODEL.into()),
            headers: HashMap::new(),
            timeout_secs: Some(120),
        }
    }

    /// An OpenAI-compatible server that needs no key (vLLM, Ollama, ...)
    pub fn local(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::Local,
            api_key: None,
            base_url: Some(base_url.into()),
            default_model: Some(model.into()),
            headers: HashMap::new(),
            timeout_secs: Some(300),
        }
    }

    /// Build an OpenAI config from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build an OpenAI config from any variable lookup.
    ///
    /// `OPENAI_API_KEY` is required; `OPENAI_BASE_URL` and `THINKLOOP_MODEL`
    /// override the defaults when set and non-empty, and `OPENAI_ORGANIZATION`
    /// is sent as the `OpenAI-Organization` header.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let api_key = non_empty(Self::API_KEY_VAR)
            .ok_or_else(|| Error::missing_env(Self::API_KEY_VAR).with_operation("config::from_env"))?;

        let mut config = Self::openai(api_key);
        if let Some(base_url) = non_empty(Self::BASE_URL_VAR) {
            config = config.with_base_url(base_url);
        }
        if let Some(model) = non_empty(Self::MODEL_VAR) {
            config = config.with_model(model);
        }
        if let Some(organization) = non_empty(Self::ORGANIZATION_VAR) {
            config = config.with_header(Self::ORGANIZATION_HEADER, organization);
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// Usage Tracking
// ============================================================================

/// Tracks token usage across multiple calls
#[derive(Debug, Clone, Default, Serialize)]
pub struct UsageTracker {
    pub total_calls: usize,
    pub total_prompt_tokens: usize,
    pub total_completion_tokens: usize,
    pub by_model: HashMap<String, Usage>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, model: &str, usage: &Usage) {
        self.total_calls += 1;
        self.total_prompt_tokens += usage.prompt_tokens;
        self.total_completion_tokens += usage.completion_tokens;

        let entry = self.by_model.entry(model.to_string()).or_default();
        entry.prompt_tokens += usage.prompt_tokens;
        entry.completion_tokens += usage.completion_tokens;
        entry.total_tokens += usage.total_tokens;
    }

    pub fn total_tokens(&self) -> usize {
        self.total_prompt_tokens + self.total_completion_tokens
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_chat_message_constructors() {
        let sys = ChatMessage::system("You are helpful");
        assert_eq!(sys.role, Role::System);
        assert_eq!(sys.content, "You are helpful");

        let user = ChatMessage::user("Hello");
        assert_eq!(user.role, Role::User);

        let asst = ChatMessage::assistant("Hi there!");
        assert_eq!(asst.role, Role::Assistant);
        assert_eq!(asst.role.as_str(), "assistant");
    }

    #[test]
    fn test_completion_request_builder() {
        let request = CompletionRequest::new(vec![ChatMessage::user("Hello")])
            .with_model("gpt-4o")
            .with_temperature(0.7)
            .with_max_tokens(1000)
            .with_stop(vec!["Observation:".into()]);

        assert_eq!(request.model, Some("gpt-4o".into()));
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(1000));
        assert_eq!(request.stop.as_deref(), Some(&["Observation:".to_string()][..]));
    }

    #[test]
    fn test_finish_reason_from_api() {
        assert_eq!(FinishReason::from_api(Some("stop")), FinishReason::Stop);
        assert_eq!(FinishReason::from_api(Some("length")), FinishReason::Length);
        assert_eq!(FinishReason::from_api(Some("tool_calls")), FinishReason::Unknown);
        assert_eq!(FinishReason::from_api(None), FinishReason::Unknown);
    }

    #[test]
    fn test_provider_config() {
        let config = ProviderConfig::openai("sk-test");
        assert_eq!(config.provider_type, ProviderType::OpenAI);
        assert_eq!(config.default_model.as_deref(), Some(DEFAULT_MODEL));

        let config = ProviderConfig::local("http://localhost:11434/v1", "llama3");
        assert_eq!(config.provider_type, ProviderType::Local);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_config_from_lookup() {
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-abc"),
            ("OPENAI_BASE_URL", "http://proxy.local/v1/"),
            ("THINKLOOP_MODEL", "gpt-4o-mini"),
            ("OPENAI_ORGANIZATION", "org-42"),
        ]
        .into_iter()
        .collect();

        let config = ProviderConfig::from_lookup(|var| env.get(var).map(|v| v.to_string())).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-abc"));
        assert_eq!(config.base_url.as_deref(), Some("http://proxy.local/v1"));
        assert_eq!(config.default_model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.headers["OpenAI-Organization"], "org-42");

        let config = config.with_timeout(5);
        assert_eq!(config.timeout_secs, Some(5));
    }

    #[test]
    fn test_config_from_lookup_requires_key() {
        let err = ProviderConfig::from_lookup(|_| None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.context_value("variable"), Some("OPENAI_API_KEY"));

        let err = ProviderConfig::from_lookup(|_| Some("   ".into())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_usage_tracker() {
        let mut tracker = UsageTracker::new();

        tracker.track("gpt-3.5-turbo", &Usage {
            prompt_tokens: 100,
            completion_tokens: 50,
            total_tokens: 150,
        });

        tracker.track("gpt-3.5-turbo", &Usage {
            prompt_tokens: 200,
            completion_tokens: 100,
            total_tokens: 300,
        });

        assert_eq!(tracker.total_calls, 2);
        assert_eq!(tracker.total_prompt_tokens, 300);
        assert_eq!(tracker.total_completion_tokens, 150);
        assert_eq!(tracker.total_tokens(), 450);
        assert_eq!(tracker.by_model["gpt-3.5-turbo"].total_tokens, 450);
    }

    #[test]
    fn test_provider_error_display() {
        assert_eq!(
            ProviderError::RateLimited { retry_after: Some(3) }.to_string(),
            "Rate limited (retry after 3s)"
        );
        assert_eq!(
            ProviderError::Api { status: 500, message: "boom".into() }.to_string(),
            "API error (500): boom"
        );
    }
}
