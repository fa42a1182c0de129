//! Bounded executor integration tests.
//!
//! Exercises the PostgreSQL client against a live database: column
//! metadata, value conversion, row-cap truncation, and error mapping.

use sqlgate::config::{ConnectionConfig, LimitConfig};
use sqlgate::db::{DatabaseClient, PostgresClient, Value};
use sqlgate::limit::{ensure_row_limit, LimitSyntax};

/// Helper to get test database URL from environment.
fn get_test_database_url() -> Option<String> {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL").ok()
}

/// Helper to create a test client.
async fn get_test_client() -> Option<PostgresClient> {
    let url = get_test_database_url()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    PostgresClient::connect(&config).await.ok()
}

#[tokio::test]
async fn test_execute_simple_select() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client
        .execute_query("SELECT 1 as num, 'hello' as greeting", 50)
        .await
        .unwrap();

    assert_eq!(result.columns.len(), 2);
    assert_eq!(result.columns[0].name, "num");
    assert_eq!(result.columns[1].name, "greeting");
    assert_eq!(result.rows.len(), 1);
    assert!(!result.was_truncated);

    match &result.rows[0][0] {
        Value::Int(1) => {}
        other => panic!("Expected Int(1), got {other:?}"),
    }
    match &result.rows[0][1] {
        Value::String(s) => assert_eq!(s, "hello"),
        other => panic!("Expected String, got {other:?}"),
    }

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_execute_select_with_null() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client
        .execute_query("SELECT NULL::text AS missing", 50)
        .await
        .unwrap();

    assert!(result.rows[0][0].is_null());

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_row_cap_truncates_large_result() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client
        .execute_query("SELECT generate_series(1, 200) AS n", 50)
        .await
        .unwrap();

    assert_eq!(result.rows.len(), 50);
    assert!(result.was_truncated);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_row_cap_not_flagged_on_exact_fit() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client
        .execute_query("SELECT generate_series(1, 50) AS n", 50)
        .await
        .unwrap();

    assert_eq!(result.rows.len(), 50);
    assert!(!result.was_truncated);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_empty_result_keeps_column_metadata() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client
        .execute_query("SELECT 1 AS n WHERE false", 50)
        .await
        .unwrap();

    assert_eq!(result.columns.len(), 1);
    assert_eq!(result.columns[0].name, "n");
    assert!(result.rows.is_empty());

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_limit_dialect_produces_valid_statement() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    assert_eq!(client.dialect(), LimitSyntax::Limit);

    let sql = ensure_row_limit("SELECT generate_series(1, 200) AS n", 50, client.dialect());
    assert_eq!(sql, "SELECT generate_series(1, 200) AS n LIMIT 50");

    let result = client.execute_query(&sql, 50).await.unwrap();
    assert_eq!(result.rows.len(), 50);
    assert!(!result.was_truncated);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_connect_with_configured_statement_timeout() {
    let Some(url) = get_test_database_url() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let config = ConnectionConfig::from_connection_string(&url).unwrap();

    let limits = LimitConfig {
        statement_timeout_secs: 1,
        ..LimitConfig::default()
    };
    let client = PostgresClient::connect_with(&config, &limits).await.unwrap();

    // A 2 s sleep must trip the configured 1 s timeout.
    let err = client
        .execute_query("SELECT pg_sleep(2)", 50)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("timed out after 1 seconds"));

    // A fast query still works on the same client.
    let result = client.execute_query("SELECT 1 AS n", 50).await.unwrap();
    assert_eq!(result.rows.len(), 1);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_query_error_surfaces_engine_message() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let err = client
        .execute_query("SELECT * FROM table_that_does_not_exist", 50)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("does not exist"));
    assert!(!err.is_client_error());

    client.close().await.unwrap();
}
