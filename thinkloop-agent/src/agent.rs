//! Agent implementation - orchestrates the plan/think/act loop

use crate::action::ActionHandler;
use crate::prompt;
use serde::Serialize;
use std::time::Duration;
use thinkloop_llm::{
    provider_error, ChatMessage, CompletionRequest, Error, LlmProvider, ProviderError, Result,
    UsageTracker,
};
use thinkloop_parser::{parse_log_entry, parse_plan, Label, LogEntry, PlanStep};
use tracing::{debug, info, warn};

/// Configuration for the agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Model override; `None` uses the provider's default
    pub model: Option<String>,
    /// Sampling temperature for every call
    pub temperature: f32,
    /// Completion length cap; `None` leaves it to the provider
    pub max_tokens: Option<usize>,
    /// Model turns allowed per plan step before giving up on it
    pub max_turns_per_subtask: usize,
    /// Extra attempts for a model call that failed with a retryable error
    pub max_retries: usize,
    /// Delay before the first retry; grows linearly with the attempt
    pub retry_backoff: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.7,
            max_tokens: None,
            max_turns_per_subtask: 6,
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// What happened while working on one plan step
#[derive(Debug, Clone, Serialize)]
pub struct SubtaskTrace {
    pub step: PlanStep,
    pub log: Vec<LogEntry>,
    /// Whether the step ended with a Final Answer
    pub answered: bool,
}

/// Result from agent execution
#[derive(Debug, Clone, Serialize)]
pub struct AgentResult {
    pub task: String,
    pub plan: Vec<PlanStep>,
    pub subtasks: Vec<SubtaskTrace>,
    /// The last Final Answer given in the run
    pub final_answer: Option<String>,
    pub usage: UsageTracker,
}

impl AgentResult {
    /// Every log entry of the run, in execution order
    pub fn log(&self) -> impl Iterator<Item = &LogEntry> {
        self.subtasks.iter().flat_map(|subtask| subtask.log.iter())
    }

    /// True when the model produced neither a plan nor any log entry
    pub fn is_empty(&self) -> bool {
        self.plan.is_empty() && self.log().next().is_none()
    }
}

/// The agent orchestrator - drives one provider through the plan and each step
pub struct Agent<P, A> {
    provider: P,
    actions: A,
    config: AgentConfig,
    usage: UsageTracker,
}

impl<P: LlmProvider, A: ActionHandler> Agent<P, A> {
    /// Create a new agent with default configuration
    pub fn new(provider: P, actions: A) -> Self {
        Self::with_config(provider, actions, AgentConfig::default())
    }

    /// Create a new agent with custom configuration
    pub fn with_config(provider: P, actions: A, config: AgentConfig) -> Self {
        Self {
            provider,
            actions,
            config,
            usage: UsageTracker::new(),
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Run a task to completion
    pub async fn run(&mut self, task: &str) -> Result<AgentResult> {
        if task.trim().is_empty() {
            return Err(Error::invalid_argument("task must not be empty").with_operation("agent::run"));
        }

        info!(provider = self.provider.name(), task, "starting agent");
        self.usage = UsageTracker::new();

        let plan = self.plan(task).await?;
        if plan.is_empty() {
            warn!("model returned no numbered plan, nothing to execute");
        }

        let mut subtasks = Vec::with_capacity(plan.len());
        for (index, step) in plan.iter().enumerate() {
            info!(step = index + 1, of = plan.len(), subtask = %step.text, "executing plan step");
            subtasks.push(self.run_subtask(step).await?);
        }

        let final_answer = subtasks
            .iter()
            .flat_map(|subtask| subtask.log.iter())
            .rev()
            .find(|entry| entry.is_final_answer())
            .map(|entry| entry.text().to_string());

        match &final_answer {
            Some(answer) => info!(answer = %answer, "agent finished"),
            None => warn!("agent finished without a final answer"),
        }

        Ok(AgentResult {
            task: task.to_string(),
            plan,
            subtasks,
            final_answer,
            usage: self.usage.clone(),
        })
    }

    /// Ask the model for a numbered plan
    async fn plan(&mut self, task: &str) -> Result<Vec<PlanStep>> {
        let messages = vec![
            ChatMessage::system(prompt::PLAN_SYSTEM),
            ChatMessage::user(prompt::plan_request(task)),
        ];
        let reply = self.complete(messages, None, "agent::plan").await?;
        debug!(reply = %reply, "plan reply");

        let plan = parse_plan(&reply);
        info!(steps = plan.len(), "parsed plan");
        Ok(plan)
    }

    /// Drive one plan step until a Final Answer or the turn budget runs out
    async fn run_subtask(&mut self, step: &PlanStep) -> Result<SubtaskTrace> {
        let mut messages = vec![
            ChatMessage::system(prompt::REACT_SYSTEM),
            ChatMessage::user(prompt::subtask(step)),
        ];
        let mut log = Vec::new();

        for turn in 1..=self.config.max_turns_per_subtask {
            let reply = self
                .complete(messages.clone(), Some(prompt::STOP_AT_OBSERVATION), "agent::subtask")
                .await?;
            messages.push(ChatMessage::assistant(reply.clone()));

            let mut next_prompt = prompt::CONTINUE.to_string();
            for entry in reply_entries(&reply) {
                match entry.label() {
                    Label::Thought => {
                        debug!(turn, thought = entry.text(), "thought");
                        log.push(entry);
                    }
                    Label::Observation => {
                        debug!(turn, text = entry.text(), "ignoring observation written by the model");
                    }
                    Label::Action => {
                        let observation = self.act(&entry).await;
                        log.push(entry);
                        next_prompt = prompt::observation(&observation);
                        log.push(LogEntry::Observation(observation));
                        // anything after the first action was written before seeing its result
                        break;
                    }
                    Label::FinalAnswer => {
                        info!(turn, answer = entry.text(), "subtask answered");
                        log.push(entry);
                        return Ok(SubtaskTrace {
                            step: step.clone(),
                            log,
                            answered: true,
                        });
                    }
                }
            }

            messages.push(ChatMessage::user(next_prompt));
        }

        warn!(
            subtask = %step.text,
            turns = self.config.max_turns_per_subtask,
            "subtask ended without a final answer"
        );
        Ok(SubtaskTrace {
            step: step.clone(),
            log,
            answered: false,
        })
    }

    /// Execute an Action entry; failures become the observation text
    async fn act(&self, entry: &LogEntry) -> String {
        let Some(call) = entry.action_call() else {
            warn!(action = entry.text(), "unparseable action");
            return format!(
                "Could not understand action '{}'. Use the form Search(\"query\").",
                entry.text()
            );
        };

        info!(action = %call.name, argument = %call.argument, "executing action");
        match self.actions.execute(&call).await {
            Ok(observation) => {
                info!(observation = %observation, "action observation");
                observation
            }
            Err(err) => {
                warn!(error = %err, "action failed");
                format!("Action {} failed: {}", call.name, err.message())
            }
        }
    }

    /// One model call, retried while the error stays retryable
    async fn complete(
        &mut self,
        messages: Vec<ChatMessage>,
        stop: Option<&str>,
        operation: &'static str,
    ) -> Result<String> {
        let mut attempt = 0;
        loop {
            let mut request = CompletionRequest::new(messages.clone())
                .with_temperature(self.config.temperature);
            if let Some(model) = &self.config.model {
                request = request.with_model(model.clone());
            }
            if let Some(max_tokens) = self.config.max_tokens {
                request = request.with_max_tokens(max_tokens);
            }
            if let Some(stop) = stop {
                request = request.with_stop(vec![stop.to_string()]);
            }

            let result = self.provider.complete(request).await.and_then(|response| {
                self.usage.track(&response.model, &response.usage);
                response
                    .content
                    .filter(|content| !content.trim().is_empty())
                    .ok_or(ProviderError::EmptyResponse)
            });

            let err = match result {
                Ok(content) => return Ok(content),
                Err(err) => provider_error(err)
                    .with_operation(operation)
                    .with_context("attempt", (attempt + 1).to_string()),
            };

            if !err.is_retryable() {
                return Err(err);
            }
            if attempt >= self.config.max_retries {
                return Err(err.persist());
            }

            attempt += 1;
            let mut delay = self.config.retry_backoff * attempt as u32;
            if let Some(secs) = err.context_value("retry_after").and_then(|s| s.parse().ok()) {
                delay = delay.max(Duration::from_secs(secs));
            }
            warn!(error = %err, attempt, delay_ms = delay.as_millis() as u64, "retrying model call");
            tokio::time::sleep(delay).await;
        }
    }
}

/// Log entries in one model reply.
///
/// A reply that opens with unlabeled text is read as a Thought, since the
/// conversation prompts end with `Thought:` or `Continue:`. Unlabeled lines
/// after a Thought or Final Answer continue its payload; after any other
/// label they are dropped.
fn reply_entries(reply: &str) -> Vec<LogEntry> {
    let mut entries: Vec<LogEntry> = Vec::new();

    for line in reply.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if let Some(entry) = parse_log_entry(line) {
            entries.push(entry);
            continue;
        }
        match entries.last_mut() {
            None => entries.push(LogEntry::Thought(line.to_string())),
            Some(LogEntry::Thought(text)) | Some(LogEntry::FinalAnswer(text)) => {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(line);
            }
            Some(_) => {}
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SearchStub;
    use thinkloop_llm::{ErrorKind, ErrorStatus, Role, ScriptedProvider};

    fn fast_config() -> AgentConfig {
        AgentConfig {
            retry_backoff: Duration::ZERO,
            ..AgentConfig::default()
        }
    }

    fn agent(replies: &[&str]) -> Agent<ScriptedProvider, SearchStub> {
        Agent::with_config(
            ScriptedProvider::new(replies.iter().copied()),
            SearchStub::new(),
            fast_config(),
        )
    }

    #[test]
    fn test_reply_entries() {
        assert_eq!(
            reply_entries("I need the ticker\nAction: Search(\"BTC\")"),
            vec![
                LogEntry::Thought("I need the ticker".into()),
                LogEntry::Action("Search(\"BTC\")".into()),
            ]
        );
        assert_eq!(
            reply_entries("Final Answer: done"),
            vec![LogEntry::FinalAnswer("done".into())]
        );
        assert!(reply_entries("   \n").is_empty());
    }

    #[test]
    fn test_reply_entries_continuation_lines() {
        assert_eq!(
            reply_entries("Thought: first the ticker,\nthen the price.\nAction: Search(\"BTC\")\nstray"),
            vec![
                LogEntry::Thought("first the ticker,\nthen the price.".into()),
                LogEntry::Action("Search(\"BTC\")".into()),
            ]
        );
        assert_eq!(
            reply_entries("Let me think.\n- ticker is BTC\nFinal Answer:\nBTC\n$54,000"),
            vec![
                LogEntry::Thought("Let me think.\n- ticker is BTC".into()),
                LogEntry::FinalAnswer("BTC\n$54,000".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_bitcoin_run() {
        let mut agent = agent(&[
            "PLAN:\n1. Identify the ticker symbol\n2. Search current price",
            "I need the ticker first\nAction: Search(\"Bitcoin ticker symbol\")",
            "Final Answer: BTC is the ticker",
            "Thought: now the price\nAction: Search('bitcoin price')",
            "Final Answer: Bitcoin trades at $54,000",
        ]);

        let result = agent.run("Get current price of Bitcoin").await.unwrap();

        assert_eq!(
            result.plan,
            vec![
                PlanStep::new(1, "Identify the ticker symbol"),
                PlanStep::new(2, "Search current price"),
            ]
        );
        assert_eq!(result.subtasks.len(), 2);
        assert!(result.subtasks.iter().all(|s| s.answered));
        assert_eq!(
            result.subtasks[0].log,
            vec![
                LogEntry::Thought("I need the ticker first".into()),
                LogEntry::Action("Search(\"Bitcoin ticker symbol\")".into()),
                LogEntry::Observation("BTC".into()),
                LogEntry::FinalAnswer("BTC is the ticker".into()),
            ]
        );
        assert_eq!(
            result.subtasks[1].log[2],
            LogEntry::Observation("It's $54,000".into())
        );
        assert_eq!(result.final_answer.as_deref(), Some("Bitcoin trades at $54,000"));
        assert_eq!(result.log().count(), 8);
        assert_eq!(result.usage.total_calls, 5);
        assert_eq!(agent.provider().remaining(), 0);
    }

    #[tokio::test]
    async fn test_conversation_shape() {
        let mut agent = agent(&[
            "1. Find the ticker",
            "Thought: search it\nAction: Search(\"bitcoin ticker\")",
            "Final Answer: BTC",
        ]);
        agent.run("What is the Bitcoin ticker?").await.unwrap();

        let requests = agent.provider().requests();
        assert_eq!(requests.len(), 3);

        let plan = &requests[0];
        assert_eq!(plan.messages[0].role, Role::System);
        assert!(plan.messages[1].content.starts_with("Task: What is the Bitcoin ticker?"));
        assert_eq!(plan.temperature, Some(0.7));

        assert_eq!(requests[1].messages[1].content, "Subtask: Find the ticker\nThought:");

        assert!(plan.stop.is_none());
        assert_eq!(requests[1].stop.as_deref(), Some(&["\nObservation:".to_string()][..]));
        assert!(requests[1].max_tokens.is_none());

        let after_action = &requests[2].messages;
        assert_eq!(after_action[2].role, Role::Assistant);
        assert_eq!(after_action[3].content, "Observation: BTC\nContinue:");
    }

    #[tokio::test]
    async fn test_empty_plan() {
        let mut agent = agent(&["Sorry, I can't plan that."]);
        let result = agent.run("do something").await.unwrap();

        assert!(result.plan.is_empty());
        assert!(result.subtasks.is_empty());
        assert!(result.final_answer.is_none());
        assert!(result.is_empty());
        assert_eq!(agent.provider().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_model_observations_are_ignored() {
        let mut agent = agent(&[
            "1. Answer directly",
            "Thought: easy\nObservation: I made this up\nFinal Answer: 4",
        ]);
        let result = agent.run("2 + 2").await.unwrap();

        assert_eq!(
            result.subtasks[0].log,
            vec![LogEntry::Thought("easy".into()), LogEntry::FinalAnswer("4".into())]
        );
    }

    #[tokio::test]
    async fn test_turn_budget() {
        let mut agent = agent(&["1. Ponder", "hmm", "still thinking", "more"]);
        agent.config.max_turns_per_subtask = 2;

        let result = agent.run("ponder").await.unwrap();

        let subtask = &result.subtasks[0];
        assert!(!subtask.answered);
        assert_eq!(
            subtask.log,
            vec![
                LogEntry::Thought("hmm".into()),
                LogEntry::Thought("still thinking".into()),
            ]
        );
        assert!(result.final_answer.is_none());
        assert_eq!(agent.provider().remaining(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_action() {
        let mut agent = agent(&[
            "1. Look",
            "Action: look it up somewhere",
            "Final Answer: unknown",
        ]);
        let result = agent.run("look").await.unwrap();

        let log = &result.subtasks[0].log;
        assert_eq!(log[0], LogEntry::Action("look it up somewhere".into()));
        assert!(log[1].text().starts_with("Could not understand action"));
    }

    #[tokio::test]
    async fn test_retries_temporary_errors() {
        let mut agent = agent(&[]);
        agent.provider().push_error(ProviderError::RateLimited { retry_after: None });
        agent.provider().push_error(ProviderError::Network("reset".into()));
        agent.provider().push_reply("no plan here");

        let result = agent.run("task").await.unwrap();
        assert!(result.plan.is_empty());
        assert_eq!(agent.provider().requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_for_retry_after() {
        let mut agent = Agent::with_config(
            ScriptedProvider::new(Vec::<String>::new()),
            SearchStub::new(),
            AgentConfig::default(),
        );
        agent.provider().push_error(ProviderError::RateLimited { retry_after: Some(3) });
        agent.provider().push_reply("no plan here");

        let start = tokio::time::Instant::now();
        agent.run("task").await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_grows_linearly() {
        let mut agent = agent(&[]);
        agent.config.retry_backoff = Duration::from_millis(100);
        agent.provider().push_error(ProviderError::Network("reset".into()));
        agent.provider().push_error(ProviderError::Network("reset".into()));
        agent.provider().push_reply("no plan here");

        let start = tokio::time::Instant::now();
        agent.run("task").await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_max_tokens_is_sent() {
        let mut agent = agent(&["1. a", "Final Answer: b"]);
        agent.config.max_tokens = Some(256);
        agent.run("task").await.unwrap();

        assert!(agent.provider().requests().iter().all(|r| r.max_tokens == Some(256)));
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let mut agent = agent(&[]);
        for _ in 0..3 {
            agent.provider().push_error(ProviderError::Api { status: 503, message: "busy".into() });
        }

        let err = agent.run("task").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
        assert_eq!(err.status(), ErrorStatus::Persistent);
        assert_eq!(err.operation(), "agent::plan");
        assert_eq!(err.context_value("attempt"), Some("3"));
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let mut agent = agent(&[]);
        agent.provider().push_error(ProviderError::Unauthenticated);
        agent.provider().push_reply("1. unreachable");

        let err = agent.run("task").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
        assert_eq!(err.status(), ErrorStatus::Permanent);
        assert_eq!(agent.provider().remaining(), 1);
    }

    #[tokio::test]
    async fn test_empty_reply_is_retried() {
        let mut agent = agent(&["   ", "1. Step\n", "Final Answer: ok"]);
        let result = agent.run("task").await.unwrap();

        assert_eq!(result.plan.len(), 1);
        assert_eq!(result.final_answer.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_blank_task_rejected() {
        let mut agent = agent(&[]);
        let err = agent.run("  ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_result_serializes() {
        let mut agent = agent(&["1. a", "Final Answer: b"]);
        let result = agent.run("task").await.unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["plan"][0]["ordinal"], 1);
        assert_eq!(json["subtasks"][0]["log"][0]["type"], "FinalAnswer");
        assert_eq!(json["final_answer"], "b");
    }
}
