//! Scripted provider: replays canned replies in order
//!
//! Used by tests and by the offline demo. Every request is recorded so
//! callers can assert on the conversation the agent built.

use super::*;
use std::collections::VecDeque;
use std::sync::Mutex;

pub struct ScriptedProvider {
    model: String,
    replies: Mutex<VecDeque<std::result::Result<String, ProviderError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            model: "scripted".into(),
            replies: Mutex::new(replies.into_iter().map(|r| Ok::<String, ProviderError>(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue another reply after the existing ones
    pub fn push_reply(&self, reply: impl Into<String>) {
        lock(&self.replies).push_back(Ok(reply.into()));
    }

    /// Queue a failure after the existing replies
    pub fn push_error(&self, error: ProviderError) {
        lock(&self.replies).push_back(Err(error));
    }

    /// Replies not yet consumed
    pub fn remaining(&self) -> usize {
        lock(&self.replies).len()
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Rough token estimate, four characters per token
fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> std::result::Result<CompletionResponse, ProviderError> {
        let prompt_tokens: usize = request
            .messages
            .iter()
            .map(|m| estimate_tokens(&m.content))
            .sum();
        let model = request.model.clone().unwrap_or_else(|| self.model.clone());
        let call = {
            let mut requests = lock(&self.requests);
            requests.push(request);
            requests.len()
        };

        let reply = lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Other(format!("script exhausted at call {}", call))))?;

        let completion_tokens = estimate_tokens(&reply);
        Ok(CompletionResponse {
            id: format!("scripted-{}", call),
            model,
            content: Some(reply),
            finish_reason: FinishReason::Stop,
            usage: Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
        })
    }
}
