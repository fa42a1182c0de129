//! PostgreSQL database client.
//!
//! Implements [`DatabaseClient`] using sqlx. Each query acquires one
//! connection from the pool for the duration of the call and releases it on
//! every exit path; rows are streamed and reading stops at the caller's
//! cap, so a result set larger than the cap is never materialized.

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, Statement, TypeInfo};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::{ConnectionConfig, LimitConfig};
use crate::db::{ColumnInfo, DatabaseClient, QueryResult, Row, Value};
use crate::error::{Error, Result};
use crate::limit::LimitSyntax;

/// Default statement timeout, independent of caller cancellation.
const DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 15;

/// PostgreSQL database client.
#[derive(Debug)]
pub struct PostgresClient {
    pool: PgPool,
    statement_timeout: Duration,
}

impl PostgresClient {
    /// Connects to the database described by the given configuration.
    ///
    /// A single attempt is made; connection failures are terminal for the
    /// caller, which decides whether to retry at its own layer.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;

        debug!(host = config.host.as_deref().unwrap_or("localhost"), "Connecting to database");

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&conn_str)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        Ok(Self {
            pool,
            statement_timeout: Duration::from_secs(DEFAULT_STATEMENT_TIMEOUT_SECS),
        })
    }

    /// Connects with the statement timeout taken from the limit
    /// configuration instead of the built-in default.
    pub async fn connect_with(config: &ConnectionConfig, limits: &LimitConfig) -> Result<Self> {
        Ok(Self::connect(config)
            .await?
            .with_statement_timeout(Duration::from_secs(limits.statement_timeout_secs)))
    }

    /// Creates a client from an existing pool. Primarily for testing.
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            statement_timeout: Duration::from_secs(DEFAULT_STATEMENT_TIMEOUT_SECS),
        }
    }

    /// Overrides the statement timeout.
    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn execute_query(&self, sql: &str, max_rows: usize) -> Result<QueryResult> {
        let start = Instant::now();

        let result = tokio::time::timeout(self.statement_timeout, self.run_bounded(sql, max_rows))
            .await
            .map_err(|_| {
                Error::execution(format!(
                    "Query timed out after {} seconds",
                    self.statement_timeout.as_secs()
                ))
            })??;

        let (columns, rows, was_truncated) = result;

        if was_truncated {
            warn!(max_rows, "Result truncated at row cap");
        }

        Ok(QueryResult {
            columns,
            rows,
            execution_time: start.elapsed(),
            was_truncated,
        })
    }

    fn dialect(&self) -> LimitSyntax {
        LimitSyntax::Limit
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

impl PostgresClient {
    /// Prepares the statement (for column metadata even on empty results),
    /// then streams rows up to the cap. The acquired connection is released
    /// when this future completes or is dropped.
    async fn run_bounded(
        &self,
        sql: &str,
        max_rows: usize,
    ) -> Result<(Vec<ColumnInfo>, Vec<Row>, bool)> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| Error::execution(format!("Failed to acquire connection: {e}")))?;

        let statement = conn
            .prepare(sql)
            .await
            .map_err(|e| Error::execution(format_query_error(e)))?;

        let columns: Vec<ColumnInfo> = statement
            .columns()
            .iter()
            .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
            .collect();

        let mut rows: Vec<Row> = Vec::new();
        let mut was_truncated = false;

        let mut stream = statement.query().fetch(&mut *conn);
        while let Some(pg_row) = stream
            .try_next()
            .await
            .map_err(|e| Error::execution(format_query_error(e)))?
        {
            if rows.len() >= max_rows {
                was_truncated = true;
                break;
            }
            rows.push(convert_row(&pg_row));
        }

        Ok((columns, rows, was_truncated))
    }
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "INT2" | "SMALLINT" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "INT4" | "INT" | "INTEGER" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "INT8" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "FLOAT4" | "REAL" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(v as f64))
            .unwrap_or(Value::Null),

        "FLOAT8" | "DOUBLE PRECISION" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        // All other types are fetched as text.
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> Error {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.port;
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        Error::execution(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("authentication failed") {
        Error::execution("Authentication failed. Check your credentials.".to_string())
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        Error::execution(format!("Connection to {host}:{port} timed out."))
    } else {
        Error::execution(error.to_string())
    }
}

/// Formats a query error, surfacing engine detail and hints when present.
fn format_query_error(error: sqlx::Error) -> String {
    if let Some(db_error) = error.as_database_error() {
        let mut result = format!("ERROR: {}", db_error.message());

        if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
            if let Some(detail) = pg_error.detail() {
                result.push_str("\n  DETAIL: ");
                result.push_str(detail);
            }
            if let Some(hint) = pg_error.hint() {
                result.push_str("\n  HINT: ");
                result.push_str(hint);
            }
        }

        result
    } else {
        error.to_string()
    }
}
