//! The text-to-SQL pipeline.
//!
//! Wires the stages together behind [`Text2SqlService`]: prompt the LLM,
//! normalize its output, classify it against a safety policy, stamp a row
//! ceiling into the statement, and (on the execute path) run it bounded.
//! Stages run strictly in order and no stage runs past a rejection. There
//! are no retries; every failure is terminal for the request.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{Config, LimitConfig};
use crate::db::{DatabaseClient, PostgresClient, Row};
use crate::error::{Error, Result};
use crate::limit::ensure_row_limit;
use crate::llm::{advisory_messages, execute_messages, LlmClient, Message, OpenRouterClient};
use crate::normalize::strip_fences;
use crate::safety::{SafetyPolicy, Verdict};

/// Advisory output: checked and limited SQL, never executed.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedSql {
    pub sql: String,
}

/// Execute output: the statement that ran plus its bounded result set.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub sql: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Text-to-SQL service over pluggable LLM and database clients.
pub struct Text2SqlService {
    llm: Box<dyn LlmClient>,
    db: Box<dyn DatabaseClient>,
    limits: LimitConfig,
    schema: String,
    advisory_policy: SafetyPolicy,
    execute_policy: SafetyPolicy,
}

impl Text2SqlService {
    /// Creates a service with default limits and an empty schema block.
    pub fn new(llm: Box<dyn LlmClient>, db: Box<dyn DatabaseClient>) -> Self {
        Self {
            llm,
            db,
            limits: LimitConfig::default(),
            schema: String::new(),
            advisory_policy: SafetyPolicy::forbidden_keywords_only(),
            execute_policy: SafetyPolicy::single_select(),
        }
    }

    /// Builds the production service from loaded configuration: an
    /// OpenRouter LLM client (API key from the environment) and a Postgres
    /// backend with the configured statement timeout. `PG*` environment
    /// variables fill in missing connection fields.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let llm = OpenRouterClient::from_config(&config.llm)?;

        let mut conn = config.connection.clone();
        conn.apply_env_defaults();
        info!(connection = %conn.display_string(), "Connecting to database");
        let db = PostgresClient::connect_with(&conn, &config.limits).await?;

        Ok(Self::new(Box::new(llm), Box::new(db)).with_limits(config.limits))
    }

    /// Sets the schema description included in execute-path prompts.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Overrides the row and ceiling limits.
    pub fn with_limits(mut self, limits: LimitConfig) -> Self {
        self.limits = limits;
        self
    }

    /// Overrides the safety policies. The advisory policy gates SQL that is
    /// only shown to the caller; the execute policy gates SQL that runs.
    pub fn with_policies(mut self, advisory: SafetyPolicy, execute: SafetyPolicy) -> Self {
        self.advisory_policy = advisory;
        self.execute_policy = execute;
        self
    }

    /// Generates SQL for display without executing it.
    ///
    /// LLM call, fence stripping, forbidden-keyword check, then a row
    /// ceiling stamped into the statement. The ceiling uses the executing
    /// backend's dialect so the advisory SQL would be valid there.
    pub async fn generate(&self, prompt: &str, cancel: CancellationToken) -> Result<GeneratedSql> {
        let prompt = validate_prompt(prompt)?;

        info!(path = "advisory", "Generating SQL");
        let messages =
            advisory_messages(prompt, self.db.dialect(), self.limits.advisory_ceiling);
        let raw = self.complete(messages, &cancel).await?;
        let sql = self.gate(&raw, self.advisory_policy, self.limits.advisory_ceiling)?;

        debug!(sql = %sql, "Advisory SQL ready");
        Ok(GeneratedSql { sql })
    }

    /// Generates SQL and executes it under the bounded executor.
    ///
    /// The execute path uses the stricter single-SELECT policy and the
    /// lower ceiling, then runs the statement with the hard row cap. A
    /// rejection ends the request before any database work.
    pub async fn generate_and_run(
        &self,
        prompt: &str,
        cancel: CancellationToken,
    ) -> Result<QueryResponse> {
        let prompt = validate_prompt(prompt)?;

        info!(path = "execute", "Generating SQL");
        let messages = execute_messages(
            prompt,
            &self.schema,
            self.db.dialect(),
            self.limits.execute_ceiling,
        );
        let raw = self.complete(messages, &cancel).await?;
        let sql = self.gate(&raw, self.execute_policy, self.limits.execute_ceiling)?;

        info!(sql = %sql, max_rows = self.limits.max_rows, "Executing bounded query");
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                warn!("Execution cancelled by caller");
                return Err(Error::Cancelled);
            }
            res = self.db.execute_query(&sql, self.limits.max_rows) => res?,
        };

        debug!(
            rows = result.row_count(),
            truncated = result.was_truncated,
            elapsed_ms = result.execution_time.as_millis() as u64,
            "Query complete"
        );

        Ok(QueryResponse {
            sql,
            columns: result.column_names(),
            rows: result.rows,
        })
    }

    /// Runs the LLM call, racing it against the cancellation token.
    async fn complete(&self, messages: Vec<Message>, cancel: &CancellationToken) -> Result<String> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                warn!("Generation cancelled by caller");
                Err(Error::Cancelled)
            }
            res = self.llm.complete(&messages) => res,
        }
    }

    /// Normalize, classify, enforce. Shared by both paths.
    fn gate(&self, raw: &str, policy: SafetyPolicy, ceiling: u32) -> Result<String> {
        let cleaned = strip_fences(raw);

        match policy.classify(&cleaned) {
            Verdict::Allow => {}
            Verdict::Reject(reason) => {
                warn!(%reason, sql = %cleaned, "Statement rejected");
                return Err(Error::Rejected(reason));
            }
        }

        Ok(ensure_row_limit(&cleaned, ceiling, self.db.dialect()))
    }
}

fn validate_prompt(prompt: &str) -> Result<&str> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(Error::input("Prompt must not be empty"));
    }
    Ok(trimmed)
}
