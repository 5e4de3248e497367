//! Text-to-SQL engine - turns a natural language question into SQL via any LlmProvider.

use crate::ai::provider::{LlmError, LlmProvider};
use crate::schema::SCHEMA_TEXT;
use std::sync::Arc;

pub struct TextToSqlEngine {
    provider: Arc<dyn LlmProvider>,
}

impl TextToSqlEngine {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Build the full prompt: role line, schema, rules, one worked example, question.
    pub fn build_prompt(&self, question: &str) -> String {
        format!(
            "You are a SQL expert. Given the PostgreSQL schema below, write one SQL query \
             that answers the user's question.\n\n\
             {SCHEMA_TEXT}\n\
             Rules:\n\
             1. Return ONLY the SQL statement, no explanation and no markdown fences.\n\
             2. Column names are camelCase and case-sensitive. Always wrap them in double quotes.\n\
             3. Use PostgreSQL syntax.\n\
             4. Use short table aliases.\n\
             5. Join tables when the question spans more than one of them.\n\
             6. Unless the question asks otherwise, end with LIMIT 100.\n\
             7. Use aggregate functions (SUM, AVG, COUNT) for totals and averages.\n\
             8. For date math use CURRENT_DATE with INTERVAL arithmetic.\n\n\
             Correct:   SELECT \"totalAmount\" FROM invoices\n\
             Incorrect: SELECT total_amount FROM invoices\n\n\
             Question: {question}\n\nSQL:"
        )
    }

    /// Translate a natural language question to SQL.
    pub async fn translate(&self, question: &str) -> Result<String, LlmError> {
        let prompt = self.build_prompt(question);
        let raw = self.provider.complete(&prompt).await?;
        // Strip any accidental markdown code fences (strip_prefix/strip_suffix remove exactly once)
        let trimmed = raw.trim();
        let inner = if let Some(s) = trimmed.strip_prefix("```sql") {
            s
        } else if let Some(s) = trimmed.strip_prefix("```") {
            s
        } else {
            trimmed
        };
        let sql = inner.strip_suffix("```").unwrap_or(inner).trim().to_string();
        Ok(sql)
    }
}
