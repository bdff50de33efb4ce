//! Typed records produced from model output

use crate::label::Label;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static ACTION_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*(\w+)\s*\((.*)\)\s*$").expect("valid regex"));

/// One item of a numbered plan.
///
/// `ordinal` is the number the model wrote, not a position: gaps,
/// duplicates and out-of-order numbers are kept as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub ordinal: u64,
    pub text: String,
}

impl PlanStep {
    pub fn new(ordinal: u64, text: impl Into<String>) -> Self {
        Self {
            ordinal,
            text: text.into(),
        }
    }
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.ordinal, self.text)
    }
}

/// A single step of the agent's reasoning trace, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content")]
pub enum LogEntry {
    Thought(String),
    Action(String),
    Observation(String),
    FinalAnswer(String),
}

impl LogEntry {
    /// Build the variant for `label` around `payload`
    pub fn new(label: Label, payload: impl Into<String>) -> Self {
        let payload = payload.into();
        match label {
            Label::Thought => LogEntry::Thought(payload),
            Label::Action => LogEntry::Action(payload),
            Label::Observation => LogEntry::Observation(payload),
            Label::FinalAnswer => LogEntry::FinalAnswer(payload),
        }
    }

    pub fn label(&self) -> Label {
        match self {
            LogEntry::Thought(_) => Label::Thought,
            LogEntry::Action(_) => Label::Action,
            LogEntry::Observation(_) => Label::Observation,
            LogEntry::FinalAnswer(_) => Label::FinalAnswer,
        }
    }

    /// The payload, whatever the variant
    pub fn text(&self) -> &str {
        match self {
            LogEntry::Thought(text)
            | LogEntry::Action(text)
            | LogEntry::Observation(text)
            | LogEntry::FinalAnswer(text) => text,
        }
    }

    pub fn is_final_answer(&self) -> bool {
        matches!(self, LogEntry::FinalAnswer(_))
    }

    /// Parse an Action payload into a tool call. `None` for other variants
    /// or when the payload is not of the form `Name(argument)`.
    pub fn action_call(&self) -> Option<ActionCall> {
        match self {
            LogEntry::Action(payload) => ActionCall::parse(payload),
            _ => None,
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label(), self.text())
    }
}

/// A tool invocation such as `Search("bitcoin ticker")`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCall {
    pub name: String,
    pub argument: String,
}

impl ActionCall {
    pub fn new(name: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            argument: argument.into(),
        }
    }

    /// Parse `Name(argument)`. Surrounding single or double quotes are
    /// stripped from the argument.
    pub fn parse(payload: &str) -> Option<Self> {
        let caps = ACTION_CALL.captures(payload)?;
        let name = caps.get(1)?.as_str();
        let argument = caps
            .get(2)?
            .as_str()
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'');
        Some(Self::new(name, argument))
    }
}

impl fmt::Display for ActionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(\"{}\")", self.name, self.argument)
    }
}

/// Everything recognized in one piece of model output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedResponse {
    pub plan: Vec<PlanStep>,
    pub log: Vec<LogEntry>,
}

impl ParsedResponse {
    /// True when nothing structured was found
    pub fn is_empty(&self) -> bool {
        self.plan.is_empty() && self.log.is_empty()
    }

    /// The last Final Answer, if the text contained one
    pub fn final_answer(&self) -> Option<&str> {
        self.log
            .iter()
            .rev()
            .find(|entry| entry.is_final_answer())
            .map(LogEntry::text)
    }

    /// The first Action entry
    pub fn first_action(&self) -> Option<&LogEntry> {
        self.log.iter().find(|entry| entry.label() == Label::Action)
    }
}
