//! Line/block tokenizer
//!
//! Each piece of text is classified on its own, with no mode carried from
//! one line to the next. A line is "in the plan" only because it looks like
//! a numbered item.

use crate::label::Label;
use regex::Regex;
use std::sync::LazyLock;

/// Leading bullets and numbering: `- `, `* `, `+ `, `• `, `1. `, `2) `, repeated.
static LIST_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:(?:[-*+•]|\d+[.)])\s*)*").expect("valid regex"));

/// `<keyword> :` followed by the payload, which may span lines. Markdown
/// emphasis around the keyword or colon (`**Thought:**`, `__Action__:`) is
/// skipped.
static LABELED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^(?:\*\*|__)?(final\s+answer|answer|thought|action|observation)(?:\*\*|__)?\s*:(?:\*\*|__)?(.*)$",
    )
    .expect("valid regex")
});

/// `<int>. <text>` on a single line.
static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\.\s*(.+)$").expect("valid regex"));

/// One classified piece of model output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// A recognized label and its untrimmed payload
    Labeled { label: Label, body: &'a str },
    /// A numbered list item; `text` is already trimmed and non-empty
    Numbered { ordinal: u64, text: &'a str },
    /// Commentary the parser does not understand
    Other(&'a str),
}

/// Classify a single line or block.
///
/// Labels take precedence: `1. Thought: x` is a labeled segment, since
/// list markers are stripped before the label is looked for.
pub fn classify(text: &str) -> Segment<'_> {
    if let Some((label, body)) = split_label(text) {
        return Segment::Labeled { label, body };
    }
    if let Some((ordinal, text)) = split_numbered(text) {
        return Segment::Numbered { ordinal, text };
    }
    Segment::Other(text)
}

/// Split text into lines and classify each non-blank one, in source order.
pub fn tokenize(text: &str) -> impl Iterator<Item = Segment<'_>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(classify)
}

/// Find a label at the start of `text`, after list markers.
pub(crate) fn split_label(text: &str) -> Option<(Label, &str)> {
    let text = text.trim();
    let stripped = &text[LIST_MARKERS.find(text).map_or(0, |m| m.end())..];

    let caps = LABELED.captures(stripped)?;
    let label = Label::from_keyword(caps.get(1)?.as_str())?;
    Some((label, caps.get(2)?.as_str()))
}

/// Match `<int>. <text>`. Lines whose text is blank, or whose number does
/// not fit in a `u64`, are not numbered items.
pub(crate) fn split_numbered(line: &str) -> Option<(u64, &str)> {
    let caps = NUMBERED.captures(line)?;
    let ordinal = caps.get(1)?.as_str().parse().ok()?;
    let text = caps.get(2)?.as_str().trim();
    if text.is_empty() {
        return None;
    }
    Some((ordinal, text))
}
