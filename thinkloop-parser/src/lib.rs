//! # thinkloop parser
//!
//! Turns the loosely structured text a language model emits into typed records.
//!
//! ## Pipeline
//! - **Tokenizer**: classifies each line as labeled, numbered, or other
//! - **Record builder**: labeled segments become [`LogEntry`] values
//! - **Plan extractor**: numbered lines become [`PlanStep`] values
//!
//! Nothing here fails. Text without recognizable structure parses to an
//! empty result, and deciding what to show in that case is up to the caller.
//!
//! ```rust
//! use thinkloop_parser::{parse_response, LogEntry, PlanStep};
//!
//! let parsed = parse_response("PLAN:\n1. Look it up\nThought: easy\nFinal Answer: 42");
//! assert_eq!(parsed.plan, vec![PlanStep::new(1, "Look it up")]);
//! assert_eq!(parsed.log.last(), Some(&LogEntry::FinalAnswer("42".into())));
//! ```

pub mod builder;
pub mod label;
pub mod plan;
pub mod record;
pub mod response;
pub mod tokenizer;

pub use builder::parse_log_entry;
pub use label::Label;
pub use plan::parse_plan;
pub use record::{ActionCall, LogEntry, ParsedResponse, PlanStep};
pub use response::parse_response;
pub use tokenizer::{classify, tokenize, Segment};
