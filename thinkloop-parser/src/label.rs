//! The closed set of entry labels a model may write

use serde::{Deserialize, Serialize};
use std::fmt;

/// A recognized entry label.
///
/// Anything else a model writes before a colon is not a label; lookups
/// return `None` for it rather than a catch-all variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Thought,
    Action,
    Observation,
    /// Written as either `Final Answer` or `Answer`
    FinalAnswer,
}

impl Label {
    pub const ALL: [Label; 4] = [
        Label::Thought,
        Label::Action,
        Label::Observation,
        Label::FinalAnswer,
    ];

    /// Canonical spelling, as it should appear when rendered or re-prompted
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Thought => "Thought",
            Label::Action => "Action",
            Label::Observation => "Observation",
            Label::FinalAnswer => "Final Answer",
        }
    }

    /// Match a label keyword, ignoring case and the amount of whitespace
    /// between words (`final   ANSWER` is `FinalAnswer`).
    pub fn from_keyword(keyword: &str) -> Option<Label> {
        let words: Vec<String> = keyword
            .split_whitespace()
            .map(str::to_ascii_lowercase)
            .collect();

        match words.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
            ["thought"] => Some(Label::Thought),
            ["action"] => Some(Label::Action),
            ["observation"] => Some(Label::Observation),
            ["answer"] | ["final", "answer"] => Some(Label::FinalAnswer),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
