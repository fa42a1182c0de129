//! LLM integration.
//!
//! Provides the client trait and implementations for turning a
//! natural-language prompt into generated SQL text. The pipeline treats the
//! generator as untrusted: whatever comes back goes through the normalizer
//! and the safety classifier before anything else happens.

pub mod mock;
pub mod openrouter;
pub mod prompt;
pub mod types;

pub use mock::MockLlmClient;
pub use openrouter::{OpenRouterClient, OpenRouterConfig, DEFAULT_MODEL};
pub use prompt::{advisory_messages, execute_messages};
pub use types::{Message, Role};

use async_trait::async_trait;

use crate::error::Result;

/// Trait for LLM clients that can generate completions.
///
/// Implementations must be thread-safe (Send + Sync) to support concurrent
/// requests.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a completion for the given messages, returning the raw
    /// response text.
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}
