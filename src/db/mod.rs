//! Database access - one short-lived connection per statement, results as JSON.

use crate::config::DbConfig;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Duration;
use tokio_postgres::types::Type;
use tokio_postgres::{NoTls, Row};
use tracing::warn;

/// Hard cap on connect + prepare + execute for a single statement.
const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database unreachable: {0}")]
    Connection(String),
    #[error("query failed: {0}")]
    Execution(String),
    #[error("query timed out after 30s")]
    Timeout,
}

impl From<tokio_postgres::Error> for DbError {
    fn from(e: tokio_postgres::Error) -> Self {
        DbError::Execution(e.to_string())
    }
}

/// What a statement produced: a result set, or a write with an affected-row count.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutcome {
    Rows(Vec<serde_json::Map<String, Value>>),
    Affected { message: String, rows_affected: u64 },
}

/// Runs one SQL statement against the invoice database.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<ExecOutcome, DbError>;
}

/// Executor backed by tokio-postgres. Each call opens a fresh connection,
/// runs the statement in autocommit mode and drops the connection on every
/// path, timeout included.
pub struct PgExecutor {
    conn: String,
}

impl PgExecutor {
    pub fn new(config: &DbConfig) -> Self {
        Self { conn: config.conn_string() }
    }

    async fn execute_inner(&self, sql: &str) -> Result<ExecOutcome, DbError> {
        let (client, connection) = tokio_postgres::connect(&self.conn, NoTls)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;
        // The connection future drives the socket; it resolves when the
        // client is dropped at the end of this call.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "postgres connection closed with error");
            }
        });

        let stmt = client.prepare(sql).await?;
        if stmt.columns().is_empty() {
            let n = client.execute(&stmt, &[]).await?;
            Ok(ExecOutcome::Affected {
                message: format!("Query executed successfully. {n} row(s) affected."),
                rows_affected: n,
            })
        } else {
            let rows = client.query(&stmt, &[]).await?;
            Ok(ExecOutcome::Rows(rows.iter().map(row_to_map).collect()))
        }
    }
}

#[async_trait]
impl SqlExecutor for PgExecutor {
    async fn execute(&self, sql: &str) -> Result<ExecOutcome, DbError> {
        match tokio::time::timeout(QUERY_TIMEOUT, self.execute_inner(sql)).await {
            Ok(result) => result,
            Err(_) => Err(DbError::Timeout),
        }
    }
}

/// Escape a string for inline use as a SQL literal.
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn row_to_map(row: &Row) -> serde_json::Map<String, Value> {
    let mut map = serde_json::Map::new();
    for (idx, col) in row.columns().iter().enumerate() {
        map.insert(col.name().to_string(), cell_to_json(row, idx, col.type_()));
    }
    map
}

/// Convert one cell to JSON. NUMERIC, dates and timestamps come back as
/// strings so the wire format never loses precision; unknown types fall back
/// to their text representation when the driver can give one.
fn cell_to_json(row: &Row, idx: usize, ty: &Type) -> Value {
    match ty.name() {
        "bool" => opt(row.try_get::<_, Option<bool>>(idx).ok().flatten()),
        "int2" => opt(row.try_get::<_, Option<i16>>(idx).ok().flatten()),
        "int4" => opt(row.try_get::<_, Option<i32>>(idx).ok().flatten()),
        "int8" => opt(row.try_get::<_, Option<i64>>(idx).ok().flatten()),
        "float4" => opt(row.try_get::<_, Option<f32>>(idx).ok().flatten()),
        "float8" => opt(row.try_get::<_, Option<f64>>(idx).ok().flatten()),
        "numeric" => row
            .try_get::<_, Option<Decimal>>(idx)
            .ok()
            .flatten()
            .map(|d| Value::String(d.to_string()))
            .unwrap_or(Value::Null),
        "text" | "varchar" | "bpchar" | "name" => {
            opt(row.try_get::<_, Option<String>>(idx).ok().flatten())
        }
        "date" => row
            .try_get::<_, Option<chrono::NaiveDate>>(idx)
            .ok()
            .flatten()
            .map(|d| Value::String(d.to_string()))
            .unwrap_or(Value::Null),
        "timestamp" => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(idx)
            .ok()
            .flatten()
            .map(|t| Value::String(t.to_string()))
            .unwrap_or(Value::Null),
        "timestamptz" => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)
            .ok()
            .flatten()
            .map(|t| Value::String(t.to_rfc3339()))
            .unwrap_or(Value::Null),
        "json" | "jsonb" => row.try_get::<_, Option<Value>>(idx).ok().flatten().unwrap_or(Value::Null),
        _ => opt(row.try_get::<_, Option<String>>(idx).ok().flatten()),
    }
}

fn opt<T: Into<Value>>(v: Option<T>) -> Value {
    v.map(Into::into).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_literal_plain() {
        assert_eq!(quote_literal("acme"), "'acme'");
    }

    #[test]
    fn test_quote_literal_doubles_single_quotes() {
        assert_eq!(quote_literal("O'Brien & Sons"), "'O''Brien & Sons'");
    }

    #[test]
    fn test_db_error_display() {
        assert_eq!(
            DbError::Connection("refused".to_string()).to_string(),
            "database unreachable: refused"
        );
        assert_eq!(DbError::Timeout.to_string(), "query timed out after 30s");
    }

    #[test]
    fn test_affected_outcome_message() {
        let outcome = ExecOutcome::Affected {
            message: "Query executed successfully. 3 row(s) affected.".to_string(),
            rows_affected: 3,
        };
        match outcome {
            ExecOutcome::Affected { message, rows_affected } => {
                assert!(message.contains("3 row(s)"));
                assert_eq!(rows_affected, 3);
            }
            ExecOutcome::Rows(_) => panic!("expected Affected"),
        }
    }
}
