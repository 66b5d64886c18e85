//! Postgres executor: `SET LOCAL statement_timeout`, run the query, decode
//! every row into a dynamically-typed JSON representation the caller
//! serializes. No SQL mutation happens here (spec §4.10) — that's the
//! evaluator's and repair loop's job, not this one's.

use crate::error::{ExecError, ExecResult};
use crate::traits::Executor;
use async_trait::async_trait;
use nlq_core::types::{ExecutionResult, ResultColumn};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Column, Row, TypeInfo};

pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, pool_size: u32) -> ExecResult<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(pool_size)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Executor for PgExecutor {
    async fn execute(&self, sql: &str, statement_timeout_ms: u64, max_rows: usize) -> ExecResult<ExecutionResult> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!("SET LOCAL statement_timeout = {statement_timeout_ms}"))
            .execute(&mut *tx)
            .await?;

        let rows = sqlx::query(sql).fetch_all(&mut *tx).await.map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("57014") => {
                ExecError::Timeout(statement_timeout_ms)
            }
            _ => ExecError::Database(e),
        })?;

        tx.commit().await?;

        let columns = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|c| ResultColumn {
                        name: c.name().to_string(),
                        data_type: c.type_info().name().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let truncated = rows.len() > max_rows;
        let decoded: Vec<Vec<serde_json::Value>> = rows
            .iter()
            .take(max_rows)
            .map(|row| decode_row(row))
            .collect();

        let row_count = decoded.len();
        log::info!("executed query, {row_count} rows returned (truncated: {truncated})");

        Ok(ExecutionResult {
            columns,
            rows: decoded,
            row_count,
            truncated,
        })
    }
}

fn decode_row(row: &PgRow) -> Vec<serde_json::Value> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| decode_value(row, idx, col.type_info().name()))
        .collect()
}

fn decode_value(row: &PgRow, idx: usize, type_name: &str) -> serde_json::Value {
    use serde_json::Value;
    match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(idx).ok().flatten().map(Value::from).unwrap_or(Value::Null),
        "INT2" | "INT4" => row.try_get::<Option<i32>, _>(idx).ok().flatten().map(Value::from).unwrap_or(Value::Null),
        "INT8" => row.try_get::<Option<i64>, _>(idx).ok().flatten().map(Value::from).unwrap_or(Value::Null),
        "FLOAT4" => row.try_get::<Option<f32>, _>(idx).ok().flatten().map(|v| Value::from(v as f64)).unwrap_or(Value::Null),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx).ok().flatten().map(Value::from).unwrap_or(Value::Null),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(idx).ok().flatten().unwrap_or(Value::Null),
        "TIMESTAMP" | "TIMESTAMPTZ" | "DATE" | "TIME" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(idx)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .or_else(|| {
                row.try_get::<Option<String>, _>(idx).ok().flatten().map(Value::String)
            })
            .unwrap_or(Value::Null),
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(idx)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),
        _ => row.try_get::<Option<String>, _>(idx).ok().flatten().map(Value::String).unwrap_or(Value::Null),
    }
}
