// Database tools bound into the agent's registry
//
// Both tools fold failures into their result text so the model can read the
// error and correct course. Only an unknown tool name is fatal, and that is
// handled upstream by the registry.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use querypilot_core::{
    ProgressSink, Tool, ToolDefinition, ToolOutcome, GET_SCHEMA_TOOL, RUNNING_QUERY_PROGRESS,
    RUN_QUERY_TOOL,
};
use querypilot_db::QueryBackend;

/// Introspects the database and returns its tables and columns
pub struct GetSchemaTool {
    backend: Arc<dyn QueryBackend>,
}

impl GetSchemaTool {
    pub fn new(backend: Arc<dyn QueryBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for GetSchemaTool {
    fn name(&self) -> &str {
        GET_SCHEMA_TOOL
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            GET_SCHEMA_TOOL,
            "Get the database schema: all tables with their columns and types. \
             Call this before writing any query.",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        )
    }

    async fn execute(&self, _arguments: Value) -> ToolOutcome {
        match self.backend.describe_schema().await {
            Ok(schema) => match serde_json::to_string_pretty(&schema) {
                Ok(text) => ToolOutcome::success(text),
                Err(err) => ToolOutcome::error(format!("Error executing query: {err}")),
            },
            Err(err) => ToolOutcome::error(format!("Error executing query: {err}")),
        }
    }
}

/// Executes a read-only SQL query and returns the rows as JSON
pub struct RunQueryTool {
    backend: Arc<dyn QueryBackend>,
    progress: Arc<dyn ProgressSink>,
}

impl RunQueryTool {
    pub fn new(backend: Arc<dyn QueryBackend>, progress: Arc<dyn ProgressSink>) -> Self {
        Self { backend, progress }
    }
}

#[async_trait]
impl Tool for RunQueryTool {
    fn name(&self) -> &str {
        RUN_QUERY_TOOL
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            RUN_QUERY_TOOL,
            "Execute a SQL SELECT query against the database and return the \
             matching rows. Do not use DML statements.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The SQL query to execute"
                    }
                },
                "required": ["query"]
            }),
        )
    }

    async fn execute(&self, arguments: Value) -> ToolOutcome {
        // Progress is best-effort; a dead observer must not fail the query
        if let Err(err) = self.progress.emit(RUNNING_QUERY_PROGRESS).await {
            tracing::warn!(error = %err, "failed to emit query progress");
        }

        let query = match arguments.get("query").and_then(Value::as_str) {
            Some(q) => q,
            None => {
                return ToolOutcome::error(
                    "Error executing query: missing required argument 'query'".to_string(),
                )
            }
        };

        match self.backend.execute(query).await {
            Ok(rows) => match serde_json::to_string(&rows) {
                Ok(text) => ToolOutcome::success(text),
                Err(err) => ToolOutcome::error(format!("Error executing query: {err}")),
            },
            Err(err) => ToolOutcome::error(format!("Error executing query: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use querypilot_core::NullProgressSink;
    use querypilot_db::{DbError, QueryRows, SchemaDescriptor};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeBackend {
        rows: Option<QueryRows>,
        error: Option<String>,
        schema_calls: AtomicUsize,
    }

    impl FakeBackend {
        fn with_rows(rows: QueryRows) -> Self {
            Self {
                rows: Some(rows),
                error: None,
                schema_calls: AtomicUsize::new(0),
            }
        }

        fn with_error(message: &str) -> Self {
            Self {
                rows: None,
                error: Some(message.to_string()),
                schema_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl QueryBackend for FakeBackend {
        async fn execute(&self, _sql: &str) -> querypilot_db::Result<QueryRows> {
            match &self.error {
                Some(message) => Err(DbError::Database(message.clone())),
                None => Ok(self.rows.clone().unwrap_or_default()),
            }
        }

        async fn describe_schema(&self) -> querypilot_db::Result<SchemaDescriptor> {
            self.schema_calls.fetch_add(1, Ordering::SeqCst);
            let mut schema = SchemaDescriptor::new();
            schema.insert(
                "orders".to_string(),
                vec!["id integer".to_string(), "total numeric".to_string()],
            );
            Ok(schema)
        }
    }

    #[tokio::test]
    async fn test_run_query_returns_rows_as_json() {
        let mut row = serde_json::Map::new();
        row.insert("count".to_string(), json!(42));
        let backend = Arc::new(FakeBackend::with_rows(vec![row]));
        let tool = RunQueryTool::new(backend, Arc::new(NullProgressSink));

        let outcome = tool
            .execute(json!({"query": "SELECT count(*) FROM orders"}))
            .await;
        assert!(outcome.is_success());
        assert_eq!(outcome.into_content(), "[{\"count\":42}]");
    }

    #[tokio::test]
    async fn test_run_query_failure_becomes_error_text() {
        let backend = Arc::new(FakeBackend::with_error(
            "Database error: syntax error at or near \"FORM\"",
        ));
        let tool = RunQueryTool::new(backend, Arc::new(NullProgressSink));

        let outcome = tool.execute(json!({"query": "SELECT * FORM orders"})).await;
        assert!(!outcome.is_success());
        let content = outcome.into_content();
        assert!(content.starts_with("Error executing query: "));
        assert!(content.contains("FORM"));
    }

    #[tokio::test]
    async fn test_run_query_missing_argument() {
        let backend = Arc::new(FakeBackend::with_rows(Vec::new()));
        let tool = RunQueryTool::new(backend, Arc::new(NullProgressSink));

        let outcome = tool.execute(json!({})).await;
        assert!(!outcome.is_success());
        assert!(outcome
            .into_content()
            .starts_with("Error executing query: "));
    }

    #[tokio::test]
    async fn test_get_schema_is_idempotent() {
        let backend = Arc::new(FakeBackend::with_rows(Vec::new()));
        let tool = GetSchemaTool::new(backend.clone());

        let first = tool.execute(json!({})).await.into_content();
        let second = tool.execute(json!({})).await.into_content();
        assert_eq!(first, second);
        assert_eq!(backend.schema_calls.load(Ordering::SeqCst), 2);
        assert!(first.contains("orders"));
        assert!(first.contains("total numeric"));
    }
}
