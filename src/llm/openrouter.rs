//! OpenRouter LLM client.
//!
//! Talks to OpenRouter's OpenAI-style chat completions API. The client
//! makes exactly one attempt per request: a failure anywhere in this
//! pipeline is terminal, and retry policy belongs to the surrounding layer.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::llm::types::Message;
use crate::llm::LlmClient;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// OpenRouter chat completions endpoint.
const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default model when none is configured.
pub const DEFAULT_MODEL: &str = "mistralai/devstral-small-2505:free";

/// Sampling temperature; low for deterministic SQL.
const TEMPERATURE: f64 = 0.2;

/// OpenRouter client configuration.
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Optional HTTP-Referer attribution header value.
    pub referer: Option<String>,
    /// Optional X-Title attribution header value.
    pub title: Option<String>,
}

impl OpenRouterConfig {
    /// Creates a new config with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            referer: None,
            title: None,
        }
    }

    /// Builds a wire config from loaded LLM settings; the API key still
    /// comes from the caller (never from the config file).
    pub fn from_llm(api_key: impl Into<String>, llm: &LlmConfig) -> Self {
        Self::new(api_key, llm.model.clone()).with_timeout(llm.timeout_secs)
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the attribution headers.
    pub fn with_attribution(
        mut self,
        referer: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        self.referer = Some(referer.into());
        self.title = Some(title.into());
        self
    }
}

/// OpenRouter LLM client.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    config: OpenRouterConfig,
    client: Client,
}

impl OpenRouterClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: OpenRouterConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::config(
                "Missing OpenRouter API key. Set OPENROUTER_API_KEY.",
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Creates a client from environment variables.
    ///
    /// Reads `OPENROUTER_API_KEY` for the API key and optionally
    /// `OPENROUTER_MODEL` for the model.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| Error::config("OPENROUTER_API_KEY environment variable not set"))?;

        let model =
            std::env::var("OPENROUTER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Self::new(OpenRouterConfig::new(api_key, model))
    }

    /// Creates a client from loaded configuration, taking the API key from
    /// `OPENROUTER_API_KEY`.
    pub fn from_config(llm: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| Error::config("OPENROUTER_API_KEY environment variable not set"))?;

        Self::new(OpenRouterConfig::from_llm(api_key, llm))
    }

    /// Converts internal messages to the wire format.
    fn convert_messages(messages: &[Message]) -> Vec<WireMessage> {
        messages
            .iter()
            .map(|m| WireMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: Self::convert_messages(messages),
            temperature: TEMPERATURE,
        };

        debug!(model = %self.config.model, "Sending OpenRouter request");

        let mut req = self
            .client
            .post(OPENROUTER_API_URL)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json");

        if let Some(referer) = &self.config.referer {
            req = req.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.config.title {
            req = req.header("X-Title", title);
        }

        let response = req.json(&request).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::upstream("OpenRouter request timed out")
            } else if e.is_connect() {
                Error::upstream("Failed to connect to OpenRouter")
            } else {
                Error::upstream(format!("OpenRouter request failed: {}", e))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::upstream(format!("Failed to read OpenRouter response: {}", e)))?;

        // The status and body are embedded verbatim for diagnostics.
        if !status.is_success() {
            return Err(Error::upstream(format!(
                "OpenRouter error ({}): {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| Error::upstream(format!("Failed to parse OpenRouter response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::upstream("OpenRouter returned no choices"))
    }
}

// OpenRouter wire types (OpenAI-style).

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: WireMessage,
}
