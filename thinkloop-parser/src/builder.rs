//! Record builder: labeled segments to [`LogEntry`] values

use crate::record::LogEntry;
use crate::tokenizer::{split_label, Segment};

/// Parse one line or block as a log entry.
///
/// Leading list markers and numbering are ignored, the label is matched
/// without regard to case or spacing, and the payload is trimmed. Returns
/// `None` when no recognized label is present; callers skip such text.
pub fn parse_log_entry(text: &str) -> Option<LogEntry> {
    let (label, body) = split_label(text)?;
    Some(LogEntry::new(label, body.trim()))
}

impl LogEntry {
    /// Build from a tokenizer segment. Only labeled segments produce an entry.
    pub fn from_segment(segment: &Segment<'_>) -> Option<Self> {
        match segment {
            Segment::Labeled { label, body } => Some(LogEntry::new(*label, body.trim())),
            Segment::Numbered { .. } | Segment::Other(_) => None,
        }
    }
}
