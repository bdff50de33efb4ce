//! Action execution
//!
//! The agent hands every parsed `Action:` to an [`ActionHandler`]. The only
//! handler shipped is [`SearchStub`], which answers from a fixed table.

use thinkloop_llm::Result;
use thinkloop_parser::ActionCall;
use tracing::debug;

/// Executes a tool call and returns the observation text
#[allow(async_fn_in_trait)]
pub trait ActionHandler: Send + Sync {
    async fn execute(&self, call: &ActionCall) -> Result<String>;
}

/// Canned search results, keyed by phrases in the query
#[derive(Debug, Clone, Default)]
pub struct SearchStub;

impl SearchStub {
    pub fn new() -> Self {
        Self
    }

    fn search(&self, query: &str) -> String {
        let query_lower = query.to_lowercase();

        if query_lower.contains("bitcoin ticker") {
            "BTC".to_string()
        } else if query_lower.contains("price of btc") || query_lower.contains("bitcoin price") {
            "It's $54,000".to_string()
        } else if query_lower.contains("weather") {
            "It's 72°F and sunny".to_string()
        } else {
            format!("Search results for '{}': Various relevant information found.", query)
        }
    }
}

impl ActionHandler for SearchStub {
    async fn execute(&self, call: &ActionCall) -> Result<String> {
        if call.name.eq_ignore_ascii_case("search") {
            debug!(query = %call.argument, "stub search");
            return Ok(self.search(&call.argument));
        }

        debug!(action = %call.name, "no handler for action, reporting success");
        Ok("Action executed successfully.".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(name: &str, argument: &str) -> String {
        SearchStub::new()
            .execute(&ActionCall::new(name, argument))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_known_queries() {
        assert_eq!(run("Search", "Bitcoin ticker symbol").await, "BTC");
        assert_eq!(run("Search", "current bitcoin price").await, "It's $54,000");
        assert_eq!(run("Search", "Price of BTC today").await, "It's $54,000");
        assert_eq!(run("search", "weather in Austin").await, "It's 72°F and sunny");
    }

    #[tokio::test]
    async fn test_unknown_query() {
        assert_eq!(
            run("Search", "rust borrow checker").await,
            "Search results for 'rust borrow checker': Various relevant information found."
        );
    }

    #[tokio::test]
    async fn test_other_actions() {
        assert_eq!(run("Calculate", "2+2").await, "Action executed successfully.");
    }
}
