//! Database abstraction layer.
//!
//! Trait-based interface for the bounded executor's backend, so the
//! pipeline can run against PostgreSQL in production and an in-memory mock
//! in tests.

mod mock;
mod postgres;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use async_trait::async_trait;

use crate::error::Result;
use crate::limit::LimitSyntax;

/// Trait defining the interface for database clients.
///
/// Implementations issue reads only; write safety is the classifier's job
/// and must never depend on the backend refusing a statement.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a single read query, returning at most `max_rows` rows.
    ///
    /// The cap is enforced while reading, independent of any limit clause
    /// in the statement itself.
    async fn execute_query(&self, sql: &str, max_rows: usize) -> Result<QueryResult>;

    /// The limit-clause syntax this backend's engine understands.
    fn dialect(&self) -> LimitSyntax;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}
