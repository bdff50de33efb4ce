//! Plan extractor

use crate::record::PlanStep;
use crate::tokenizer::split_numbered;

/// Collect every `<int>. <text>` line, in source order.
///
/// Ordinals are kept exactly as the model wrote them. Several numbered
/// lists in one text are all collected. No numbered lines means an empty
/// plan, which is not an error.
pub fn parse_plan(text: &str) -> Vec<PlanStep> {
    text.lines()
        .filter_map(split_numbered)
        .map(|(ordinal, text)| PlanStep::new(ordinal, text))
        .collect()
}
