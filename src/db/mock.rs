//! Mock database clients for testing.

use async_trait::async_trait;

use crate::db::{ColumnInfo, DatabaseClient, QueryResult, Row, Value};
use crate::error::{Error, Result};
use crate::limit::LimitSyntax;

/// Mock database client that returns canned rows.
///
/// By default it answers every query with two rows of a small `Orders`
/// table. Use [`with_rows`](Self::with_rows) to substitute a custom result,
/// for instance a large one to exercise row-cap truncation.
#[derive(Debug, Clone)]
pub struct MockDatabaseClient {
    columns: Vec<ColumnInfo>,
    rows: Vec<Row>,
    dialect: LimitSyntax,
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDatabaseClient {
    pub fn new() -> Self {
        Self {
            columns: vec![
                ColumnInfo::new("Id", "int"),
                ColumnInfo::new("Total", "float"),
            ],
            rows: vec![
                vec![Value::Int(1), Value::Float(9.99)],
                vec![Value::Int(2), Value::Float(24.50)],
            ],
            dialect: LimitSyntax::Top,
        }
    }

    /// Replaces the canned result set.
    pub fn with_rows(mut self, columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        self.columns = columns;
        self.rows = rows;
        self
    }

    /// Overrides the dialect reported to the limit enforcer.
    pub fn with_dialect(mut self, dialect: LimitSyntax) -> Self {
        self.dialect = dialect;
        self
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&self, _sql: &str, max_rows: usize) -> Result<QueryResult> {
        let was_truncated = self.rows.len() > max_rows;
        let rows: Vec<Row> = self.rows.iter().take(max_rows).cloned().collect();
        Ok(QueryResult::with_data(self.columns.clone(), rows, was_truncated))
    }

    fn dialect(&self) -> LimitSyntax {
        self.dialect
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Mock database client that fails every query. For error-path tests.
#[derive(Debug, Clone)]
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute_query(&self, _sql: &str, _max_rows: usize) -> Result<QueryResult> {
        Err(Error::execution(self.message.clone()))
    }

    fn dialect(&self) -> LimitSyntax {
        LimitSyntax::Top
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
