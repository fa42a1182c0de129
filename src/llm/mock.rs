//! Mock LLM client for testing.
//!
//! Returns canned responses based on input patterns, without network calls.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::llm::types::{Message, Role};
use crate::llm::LlmClient;

/// Mock LLM client that maps input patterns to fixed responses.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response), checked in order.
    responses: Vec<(String, String)>,
    /// When set, every call fails with an upstream error.
    fail_with: Option<String>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a response mapping: when the user input contains `pattern`
    /// (case-insensitive), the mock returns `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.responses.push((pattern.into(), response.into()));
        self
    }

    /// Makes every completion fail with the given upstream error message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            responses: Vec::new(),
            fail_with: Some(message.into()),
        }
    }

    fn mock_response(&self, input: &str) -> String {
        let input_lower = input.to_lowercase();

        for (pattern, response) in &self.responses {
            if input_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if input_lower.contains("count") {
            return "SELECT COUNT(*) AS Total FROM Orders".to_string();
        }

        "SELECT * FROM Orders".to_string()
    }

    fn extract_user_input(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        if let Some(message) = &self.fail_with {
            return Err(Error::upstream(message.clone()));
        }
        let input = Self::extract_user_input(messages);
        Ok(self.mock_response(&input))
    }
}
