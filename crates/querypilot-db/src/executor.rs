// SQL executor: runs queries against Postgres with retries and returns
// JSON-shaped rows, plus schema introspection for the tool layer

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row, TypeInfo};
use uuid::Uuid;

use crate::error::{DbError, Result};
use crate::retry::RetryPolicy;

/// Rows returned by a query, one JSON object per row keyed by column name
pub type QueryRows = Vec<Map<String, Value>>;

/// Qualified table name ("schema.table") -> column descriptions
/// ("name type"), ordered by position
pub type SchemaDescriptor = BTreeMap<String, Vec<String>>;

/// Abstraction over the database used by the agent's tools
///
/// Tools depend on this trait rather than on a concrete pool so tests can
/// substitute scripted backends.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Execute a SQL statement and return its rows
    async fn execute(&self, sql: &str) -> Result<QueryRows>;

    /// Describe all base tables outside the system schemas
    async fn describe_schema(&self) -> Result<SchemaDescriptor>;
}

/// Postgres-backed executor with exponential-backoff retries
pub struct SqlExecutor {
    pool: PgPool,
    policy: RetryPolicy,
}

impl SqlExecutor {
    /// Connect to the database at `url` with a small connection pool
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn try_execute(&self, sql: &str) -> Result<QueryRows> {
        // Each attempt gets a fresh connection so a poisoned one is not reused
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(sql).fetch_all(&mut *conn).await?;
        rows.iter().map(row_to_json).collect()
    }

    async fn try_describe_schema(&self) -> Result<SchemaDescriptor> {
        // ::text casts keep the metadata columns in plain-string form
        let tables: Vec<(String, String)> = sqlx::query_as(
            "SELECT table_schema::text, table_name::text \
             FROM information_schema.tables \
             WHERE table_type = 'BASE TABLE' \
               AND table_schema NOT IN ('pg_catalog', 'information_schema') \
             ORDER BY table_schema, table_name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut schema = SchemaDescriptor::new();
        for (table_schema, table) in tables {
            let columns: Vec<(String, String)> = sqlx::query_as(
                "SELECT column_name::text, data_type::text \
                 FROM information_schema.columns \
                 WHERE table_schema = $1 AND table_name = $2 \
                 ORDER BY ordinal_position",
            )
            .bind(&table_schema)
            .bind(&table)
            .fetch_all(&self.pool)
            .await?;

            let described = columns
                .into_iter()
                .map(|(name, data_type)| format!("{name} {data_type}"))
                .collect();
            schema.insert(format!("{table_schema}.{table}"), described);
        }
        Ok(schema)
    }
}

/// Run `operation` under `policy`, sleeping between attempts
async fn run_with_retries<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let delay = policy.delay_for_attempt(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !policy.has_attempts_remaining(attempt) {
                    return Err(err);
                }
                tracing::warn!(attempt, error = %err, "database operation failed, retrying");
            }
        }
    }
}

#[async_trait]
impl QueryBackend for SqlExecutor {
    async fn execute(&self, sql: &str) -> Result<QueryRows> {
        run_with_retries(&self.policy, || self.try_execute(sql)).await
    }

    async fn describe_schema(&self) -> Result<SchemaDescriptor> {
        run_with_retries(&self.policy, || self.try_describe_schema()).await
    }
}

/// Convert one Postgres row into a JSON object keyed by column name
///
/// NUMERIC values are rendered as strings to avoid float precision loss.
/// Types without a dedicated mapping fall back to their text form.
fn row_to_json(row: &PgRow) -> Result<Map<String, Value>> {
    let mut object = Map::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let name = column.name().to_string();
        let value = column_to_json(row, idx, column.type_info().name())?;
        object.insert(name, value);
    }
    Ok(object)
}

fn column_to_json(row: &PgRow, idx: usize, type_name: &str) -> Result<Value> {
    let value = match type_name {
        "BOOL" => row
            .try_get::<Option<bool>, _>(idx)?
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        "INT2" => row
            .try_get::<Option<i16>, _>(idx)?
            .map(|v| Value::Number(v.into()))
            .unwrap_or(Value::Null),
        "INT4" => row
            .try_get::<Option<i32>, _>(idx)?
            .map(|v| Value::Number(v.into()))
            .unwrap_or(Value::Null),
        "INT8" => row
            .try_get::<Option<i64>, _>(idx)?
            .map(|v| Value::Number(v.into()))
            .unwrap_or(Value::Null),
        "FLOAT4" => float_to_json(row.try_get::<Option<f32>, _>(idx)?.map(f64::from)),
        "FLOAT8" => float_to_json(row.try_get::<Option<f64>, _>(idx)?),
        "NUMERIC" => row
            .try_get::<Option<Decimal>, _>(idx)?
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => row
            .try_get::<Option<String>, _>(idx)?
            .map(Value::String)
            .unwrap_or(Value::Null),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(idx)?
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(idx)?
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(idx)?
            .map(|v| Value::String(v.to_rfc3339()))
            .unwrap_or(Value::Null),
        "UUID" => row
            .try_get::<Option<Uuid>, _>(idx)?
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),
        "JSON" | "JSONB" => row
            .try_get::<Option<Value>, _>(idx)?
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<Option<String>, _>(idx)
            .map(|opt| opt.map(Value::String).unwrap_or(Value::Null))
            .map_err(|err| DbError::Database(format!("unsupported column type {type_name}: {err}")))?,
    };
    Ok(value)
}

fn float_to_json(value: Option<f64>) -> Value {
    match value.and_then(serde_json::Number::from_f64) {
        Some(number) => Value::Number(number),
        None => Value::Null,
    }
}
