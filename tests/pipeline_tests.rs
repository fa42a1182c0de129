//! End-to-end pipeline tests.
//!
//! Drive the full service through mock LLM and database clients; no
//! network or database required.

use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use sqlgate::config::LimitConfig;
use sqlgate::limit::LimitSyntax;
use sqlgate::db::{ColumnInfo, FailingDatabaseClient, MockDatabaseClient, Value};
use sqlgate::llm::MockLlmClient;
use sqlgate::safety::{KeywordMatch, SafetyPolicy};
use sqlgate::{Error, Text2SqlService};

fn service(llm: MockLlmClient, db: MockDatabaseClient) -> Text2SqlService {
    Text2SqlService::new(Box::new(llm), Box::new(db))
}

#[tokio::test]
async fn test_fenced_select_is_limited_and_executed() {
    let llm = MockLlmClient::new().with_response(
        "recent orders",
        "```sql\nSELECT * FROM Orders ORDER BY CreatedAt DESC\n```",
    );
    let svc = service(llm, MockDatabaseClient::new());

    let resp = svc
        .generate_and_run("show me recent orders", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        resp.sql,
        "SELECT TOP (50) * FROM Orders ORDER BY CreatedAt DESC"
    );
    assert!(resp.rows.len() <= 50);
}

#[tokio::test]
async fn test_injected_drop_is_rejected_without_execution() {
    let llm = MockLlmClient::new().with_response("orders", "DROP TABLE Orders; SELECT 1");
    let svc = Text2SqlService::new(
        Box::new(llm),
        Box::new(FailingDatabaseClient::new("must not run")),
    );

    let err = svc
        .generate_and_run("show me all orders", CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Rejected(_)));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_existing_top_clause_is_preserved() {
    let llm = MockLlmClient::new().with_response("five", "SELECT TOP (5) Id FROM Orders");
    let svc = service(llm, MockDatabaseClient::new());

    let resp = svc
        .generate_and_run("give me five order ids", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(resp.sql, "SELECT TOP (5) Id FROM Orders");
}

#[tokio::test]
async fn test_cte_gets_limit_on_outer_select() {
    let llm = MockLlmClient::new().with_response(
        "totals",
        "WITH Totals AS (SELECT CustomerId, SUM(Amount) AS Total FROM Orders GROUP BY CustomerId) SELECT CustomerId, Total FROM Totals ORDER BY Total DESC",
    );
    let svc = service(llm, MockDatabaseClient::new());

    let resp = svc
        .generate_and_run("totals per customer", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        resp.sql,
        "WITH Totals AS (SELECT CustomerId, SUM(Amount) AS Total FROM Orders GROUP BY CustomerId) SELECT TOP (50) CustomerId, Total FROM Totals ORDER BY Total DESC"
    );
}

#[tokio::test]
async fn test_advisory_path_uses_higher_ceiling_and_skips_execution() {
    let llm = MockLlmClient::new().with_response("orders", "SELECT * FROM Orders");
    // A failing database client proves the advisory path never executes;
    // its dialect is still consulted for the limit form.
    let svc = Text2SqlService::new(
        Box::new(llm),
        Box::new(FailingDatabaseClient::new("must not run")),
    );

    let out = svc
        .generate("show me all orders", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(out.sql, "SELECT TOP (100) * FROM Orders");
}

#[tokio::test]
async fn test_hard_cap_overrides_generous_statement() {
    // The statement already carries TOP (5000); the executor cap still
    // holds at the configured max_rows.
    let llm = MockLlmClient::new().with_response("everything", "SELECT TOP (5000) n FROM Big");
    let columns = vec![ColumnInfo::new("n", "int")];
    let rows: Vec<Vec<Value>> = (0..5000).map(|i| vec![Value::Int(i)]).collect();
    let db = MockDatabaseClient::new().with_rows(columns, rows);
    let svc = service(llm, db);

    let resp = svc
        .generate_and_run("give me everything", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(resp.rows.len(), 50);
}

#[tokio::test]
async fn test_limit_dialect_backend_gets_pure_postgres_sql() {
    // With a Limit-dialect backend the whole pipeline speaks Postgres: the
    // model is prompted for LIMIT, and the enforcer appends LIMIT, so no
    // T-SQL TOP clause ever reaches the engine.
    let llm = MockLlmClient::new().with_response("orders", "SELECT * FROM Orders");
    let db = MockDatabaseClient::new().with_dialect(LimitSyntax::Limit);
    let svc = service(llm, db);

    let resp = svc
        .generate_and_run("show me all orders", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(resp.sql, "SELECT * FROM Orders LIMIT 50");
    assert!(!resp.sql.contains("TOP"));
}

#[tokio::test]
async fn test_custom_limits_are_honored() {
    let llm = MockLlmClient::new().with_response("orders", "SELECT * FROM Orders");
    let columns = vec![ColumnInfo::new("n", "int")];
    let rows: Vec<Vec<Value>> = (0..100).map(|i| vec![Value::Int(i)]).collect();
    let db = MockDatabaseClient::new().with_rows(columns, rows);

    let svc = service(llm, db).with_limits(LimitConfig {
        execute_ceiling: 10,
        max_rows: 10,
        ..LimitConfig::default()
    });

    let resp = svc
        .generate_and_run("show me all orders", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(resp.sql, "SELECT TOP (10) * FROM Orders");
    assert_eq!(resp.rows.len(), 10);
}

#[tokio::test]
async fn test_substring_policy_rejects_keyword_in_identifier() {
    // Substring mode matches raw text, so a harmless identifier that
    // contains a forbidden word is still rejected.
    let llm = MockLlmClient::new().with_response("updated", "SELECT LastUpdate FROM Orders");
    let svc = service(llm, MockDatabaseClient::new()).with_policies(
        SafetyPolicy::forbidden_keywords_only().with_keyword_match(KeywordMatch::Substring),
        SafetyPolicy::single_select().with_keyword_match(KeywordMatch::Substring),
    );

    let err = svc
        .generate("when were orders last updated", CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Rejected(_)));
}

#[tokio::test]
async fn test_token_policy_allows_keyword_in_identifier() {
    let llm = MockLlmClient::new().with_response("updated", "SELECT LastUpdate FROM Orders");
    let svc = service(llm, MockDatabaseClient::new());

    let out = svc
        .generate("when were orders last updated", CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(out.sql, "SELECT TOP (100) LastUpdate FROM Orders");
}

#[tokio::test]
async fn test_non_select_rejected_on_execute_path_only() {
    // EXPLAIN carries no forbidden keyword, so the advisory policy lets it
    // through while the execute policy requires a SELECT start.
    let llm = MockLlmClient::new().with_response("plan", "EXPLAIN SELECT * FROM Orders");
    let svc = service(llm, MockDatabaseClient::new());

    let advisory = svc
        .generate("plan for all orders", CancellationToken::new())
        .await;
    assert!(advisory.is_ok());

    let executed = svc
        .generate_and_run("plan for all orders", CancellationToken::new())
        .await;
    assert!(matches!(executed.unwrap_err(), Error::Rejected(_)));
}

#[tokio::test]
async fn test_upstream_failure_is_server_error() {
    let svc = service(
        MockLlmClient::failing("OpenRouter error (503): unavailable"),
        MockDatabaseClient::new(),
    );

    let err = svc
        .generate("show me all orders", CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Upstream(_)));
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let svc = service(MockLlmClient::new(), MockDatabaseClient::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = svc
        .generate_and_run("show me all orders", cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}
