//! Plain-text rendering of parse and agent results

use thinkloop_agent::AgentResult;
use thinkloop_parser::{LogEntry, ParsedResponse, PlanStep};

pub const NO_STRUCTURE: &str = "No plan or Thought/Action/Observation/Answer lines were recognized.";
pub const NO_ANSWER: &str = "The agent did not reach a final answer.";

/// Character-safe truncation with an ellipsis
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}…", head)
    }
}

/// One log line: `Label: payload`, observations shortened unless `full`
pub fn format_entry(entry: &LogEntry, full: bool) -> String {
    let text = match entry {
        LogEntry::Observation(text) if !full => truncate(text, 200),
        _ => entry.text().to_string(),
    };
    format!("  {:<14}{}", format!("{}:", entry.label()), text)
}

fn print_plan(plan: &[PlanStep]) {
    println!("--- PLAN ---");
    for step in plan {
        println!("  {}", step);
    }
}

pub fn print_parsed(parsed: &ParsedResponse) {
    if parsed.is_empty() {
        println!("{}", NO_STRUCTURE);
        return;
    }

    if !parsed.plan.is_empty() {
        print_plan(&parsed.plan);
    }
    if !parsed.log.is_empty() {
        if !parsed.plan.is_empty() {
            println!();
        }
        println!("--- LOG ({} entries) ---", parsed.log.len());
        for entry in &parsed.log {
            println!("{}", format_entry(entry, true));
        }
    }
}

pub fn print_result(result: &AgentResult, verbose: bool, quiet: bool) {
    if quiet {
        println!("{}", result.final_answer.as_deref().unwrap_or(NO_ANSWER));
        return;
    }

    if result.is_empty() {
        println!("{}", NO_STRUCTURE);
        return;
    }

    print_plan(&result.plan);

    for subtask in &result.subtasks {
        println!();
        let status = if subtask.answered { "" } else { " (unanswered)" };
        println!("### {}{}", subtask.step, status);
        for entry in &subtask.log {
            println!("{}", format_entry(entry, verbose));
        }
    }

    println!("\n--- FINAL ANSWER ---\n");
    println!("{}", result.final_answer.as_deref().unwrap_or(NO_ANSWER));

    if verbose {
        println!(
            "\n--- Usage ({} calls, {} prompt + {} completion tokens) ---",
            result.usage.total_calls,
            result.usage.total_prompt_tokens,
            result.usage.total_completion_tokens
        );
        for (model, usage) in &result.usage.by_model {
            println!("  {}: {} tokens", model, usage.total_tokens);
        }
    }
}
