//! Prompt templates

use thinkloop_parser::PlanStep;

pub(crate) const PLAN_SYSTEM: &str =
    "You are a helpful assistant that breaks down tasks into numbered steps.";

pub(crate) const REACT_SYSTEM: &str = "You are an agent that thinks step by step.
When given a subtask:
1. First respond with \"Thought:\" followed by your reasoning
2. Then either:
   - \"Action: Search('query')\" to search for information
   - \"Final Answer: your answer\" when you have enough information
Never write an Observation yourself; it will be provided after each Action.";

pub(crate) const CONTINUE: &str = "Continue:";

/// Subtask replies are cut before the model invents its own observation
pub(crate) const STOP_AT_OBSERVATION: &str = "\nObservation:";

pub(crate) fn plan_request(task: &str) -> String {
    format!(
        "Task: {}\nGenerate a Plan: list each subtask as a numbered checklist.",
        task
    )
}

pub(crate) fn subtask(step: &PlanStep) -> String {
    format!("Subtask: {}\nThought:", step.text)
}

pub(crate) fn observation(observation: &str) -> String {
    format!("Observation: {}\n{}", observation, CONTINUE)
}
