//! Whole-response parsing

use crate::record::{LogEntry, ParsedResponse, PlanStep};
use crate::tokenizer::{tokenize, Segment};

/// Parse a full model response into plan steps and log entries.
///
/// One pass over the lines: labeled lines become log entries, other
/// numbered lines become plan steps, and everything else (headers such as
/// `PLAN:`, commentary) is dropped. Source order is preserved in both
/// sequences.
pub fn parse_response(text: &str) -> ParsedResponse {
    let mut parsed = ParsedResponse::default();

    for segment in tokenize(text) {
        if let Some(entry) = LogEntry::from_segment(&segment) {
            parsed.log.push(entry);
        } else if let Segment::Numbered { ordinal, text } = segment {
            parsed.plan.push(PlanStep::new(ordinal, text));
        }
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::parse_plan;

    const BITCOIN: &str = "PLAN:
1. Identify the ticker symbol
2. Search current price
Thought: I need the ticker first
Action: Search(\"Bitcoin ticker symbol\")
Observation: BTC
Final Answer: BTC is the ticker
";

    #[test]
    fn test_end_to_end_scenario() {
        let parsed = parse_response(BITCOIN);

        assert_eq!(
            parsed.plan,
            vec![
                PlanStep::new(1, "Identify the ticker symbol"),
                PlanStep::new(2, "Search current price"),
            ]
        );
        assert_eq!(
            parsed.log,
            vec![
                LogEntry::Thought("I need the ticker first".into()),
                LogEntry::Action("Search(\"Bitcoin ticker symbol\")".into()),
                LogEntry::Observation("BTC".into()),
                LogEntry::FinalAnswer("BTC is the ticker".into()),
            ]
        );
        assert_eq!(parsed.final_answer(), Some("BTC is the ticker"));
    }

    #[test]
    fn test_empty_input() {
        let parsed = parse_response("");
        assert!(parsed.plan.is_empty());
        assert!(parsed.log.is_empty());
        assert!(parse_response("  \n\n\t").is_empty());
    }

    #[test]
    fn test_idempotent() {
        assert_eq!(parse_response(BITCOIN), parse_response(BITCOIN));
    }

    #[test]
    fn test_interleaved_order_is_preserved() {
        let text = "Thought: t1\nAction: a1\nObservation: o1\nThought: t2\n\
                    Observation: o2\nAction: a2\nThought: t3";
        let labels: Vec<_> = parse_response(text)
            .log
            .iter()
            .map(|entry| entry.to_string())
            .collect();
        assert_eq!(
            labels,
            vec![
                "Thought: t1",
                "Action: a1",
                "Observation: o1",
                "Thought: t2",
                "Observation: o2",
                "Action: a2",
                "Thought: t3",
            ]
        );
    }

    #[test]
    fn test_commentary_is_dropped() {
        let text = "Sure! Let me think.\nThought: x\nRandom sentence.\nAction: y\nHope that helps.";
        let parsed = parse_response(text);
        assert!(parsed.plan.is_empty());
        assert_eq!(
            parsed.log,
            vec![LogEntry::Thought("x".into()), LogEntry::Action("y".into())]
        );
    }

    #[test]
    fn test_numbered_label_is_a_log_entry() {
        let text = "1. Thought: numbered reasoning\n2. real step";
        let parsed = parse_response(text);
        assert_eq!(parsed.plan, vec![PlanStep::new(2, "real step")]);
        assert_eq!(parsed.log, vec![LogEntry::Thought("numbered reasoning".into())]);

        // parse_plan only looks at the numbering
        assert_eq!(parse_plan(text).len(), 2);
    }

    #[test]
    fn test_plan_matches_parse_plan_for_unlabeled_lists() {
        let text = "Here is the plan\n1. a\n\n3. b\nThought: go";
        assert_eq!(parse_response(text).plan, parse_plan(text));
    }
}
