//! # thinkloop agent
//!
//! The agent runs a fixed loop over one chat model:
//! 1. Ask the model for a numbered plan for the task
//! 2. For each plan step, let the model think in `Thought:` lines
//! 3. Execute each `Action:` it requests and feed back an `Observation:`
//! 4. Stop the step at its `Final Answer:` (or when the turn budget runs out)
//!
//! Model text is turned into records by `thinkloop-parser`; the agent only
//! decides what to do with them.

mod action;
mod agent;
mod prompt;

pub use action::{ActionHandler, SearchStub};
pub use agent::{Agent, AgentConfig, AgentResult, SubtaskTrace};
