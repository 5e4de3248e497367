//! Query service - prompt, completion, normalization and execution in one pipeline.

use crate::ai::{IdentifierNormalizer, LlmProvider, TextToSqlEngine};
use crate::db::{ExecOutcome, SqlExecutor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub question: String,
    pub sql: String,
    pub results: Vec<serde_json::Map<String, Value>>,
    pub error: Option<String>,
}

impl QueryResponse {
    fn failure(question: &str, sql: String, error: String) -> Self {
        Self {
            question: question.to_string(),
            sql,
            results: Vec::new(),
            error: Some(error),
        }
    }
}

/// Answers natural language questions against the invoice database.
///
/// Owns the full pipeline: prompt building, completion, identifier
/// normalization, execution.
pub struct QueryService {
    engine: TextToSqlEngine,
    normalizer: IdentifierNormalizer,
    executor: Arc<dyn SqlExecutor>,
}

impl QueryService {
    pub fn new(provider: Arc<dyn LlmProvider>, executor: Arc<dyn SqlExecutor>) -> Self {
        Self {
            engine: TextToSqlEngine::new(provider),
            normalizer: IdentifierNormalizer::new(),
            executor,
        }
    }

    /// Answer one question. Never returns Err: every failure becomes a
    /// response with the reason in `error`. A translation failure leaves
    /// `sql` empty; an execution failure carries the SQL that was attempted.
    pub async fn handle(&self, question: &str) -> QueryResponse {
        let raw = match self.engine.translate(question).await {
            Ok(sql) => sql,
            Err(e) => {
                error!(error = %e, "text-to-sql translation failed");
                return QueryResponse::failure(question, String::new(), e.to_string());
            }
        };

        let sql = self.normalizer.normalize(&raw);
        info!(%sql, "executing generated SQL");

        match self.executor.execute(&sql).await {
            Ok(ExecOutcome::Rows(results)) => QueryResponse {
                question: question.to_string(),
                sql,
                results,
                error: None,
            },
            Ok(ExecOutcome::Affected { message, rows_affected }) => {
                let mut row = serde_json::Map::new();
                row.insert("message".to_string(), Value::String(message));
                row.insert("rowsAffected".to_string(), Value::from(rows_affected));
                QueryResponse {
                    question: question.to_string(),
                    sql,
                    results: vec![row],
                    error: None,
                }
            }
            Err(e) => {
                error!(error = %e, %sql, "generated SQL failed to execute");
                QueryResponse::failure(question, sql, e.to_string())
            }
        }
    }
}
