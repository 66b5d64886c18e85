//! `EXPLAIN (FORMAT JSON)` against the target database, per candidate, with
//! a per-statement timeout (spec §4.8 step 3).

use async_trait::async_trait;
use nlq_core::types::ExplainOutcome;
use sqlx::{PgPool, Row};

#[async_trait]
pub trait ExplainClient: Send + Sync {
    async fn explain(&self, sql: &str, timeout_ms: u64) -> ExplainOutcome;
}

pub struct PgExplainClient {
    pool: PgPool,
}

impl PgExplainClient {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExplainClient for PgExplainClient {
    async fn explain(&self, sql: &str, timeout_ms: u64) -> ExplainOutcome {
        let query = format!("EXPLAIN (FORMAT JSON) {sql}");
        let result = tokio::time::timeout(std::time::Duration::from_millis(timeout_ms), async {
            let mut conn = self.pool.acquire().await?;
            sqlx::query(&format!("SET LOCAL statement_timeout = {timeout_ms}"))
                .execute(&mut *conn)
                .await?;
            sqlx::query(&query).fetch_one(&mut *conn).await
        })
        .await;

        match result {
            Err(_) => {
                log::warn!("EXPLAIN timed out after {timeout_ms}ms");
                ExplainOutcome::TimedOut
            }
            Ok(Err(e)) => {
                log::debug!("EXPLAIN failed: {e}");
                ExplainOutcome::Error { message: e.to_string() }
            }
            Ok(Ok(row)) => {
                let raw: serde_json::Value = row.try_get(0).unwrap_or(serde_json::Value::Null);
                let plan = raw.get(0).and_then(|v| v.get("Plan")).cloned();
                let estimated_rows = plan.as_ref().and_then(|p| p.get("Plan Rows")).and_then(|v| v.as_f64());
                let estimated_cost = plan.as_ref().and_then(|p| p.get("Total Cost")).and_then(|v| v.as_f64());
                ExplainOutcome::Ok {
                    estimated_rows,
                    estimated_cost,
                    plan_json: raw,
                }
            }
        }
    }
}

/// In-memory fake for tests: returns a preset outcome regardless of `sql`.
pub struct FakeExplainClient {
    pub outcome: ExplainOutcome,
}

impl FakeExplainClient {
    pub fn always_ok() -> Self {
        Self {
            outcome: ExplainOutcome::Ok {
                estimated_rows: Some(10.0),
                estimated_cost: Some(1.0),
                plan_json: serde_json::json!([{"Plan": {"Plan Rows": 10, "Total Cost": 1.0}}]),
            },
        }
    }

    pub fn always_failing() -> Self {
        Self {
            outcome: ExplainOutcome::Error {
                message: "relation does not exist".to_string(),
            },
        }
    }
}

#[async_trait]
impl ExplainClient for FakeExplainClient {
    async fn explain(&self, _sql: &str, _timeout_ms: u64) -> ExplainOutcome {
        self.outcome.clone()
    }
}
