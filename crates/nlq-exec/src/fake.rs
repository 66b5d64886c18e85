use crate::error::{ExecError, ExecResult};
use crate::traits::Executor;
use async_trait::async_trait;
use nlq_core::types::ExecutionResult;

/// In-memory executor for orchestrator tests: returns a fixed result (or a
/// fixed error) regardless of the SQL it's given.
pub enum FakeExecutor {
    Returns(ExecutionResult),
    Fails,
    TimesOut,
}

impl FakeExecutor {
    pub fn returning(result: ExecutionResult) -> Self {
        FakeExecutor::Returns(result)
    }
}

#[async_trait]
impl Executor for FakeExecutor {
    async fn execute(&self, _sql: &str, statement_timeout_ms: u64, max_rows: usize) -> ExecResult<ExecutionResult> {
        match self {
            FakeExecutor::Returns(result) => {
                let mut result = result.clone();
                if result.rows.len() > max_rows {
                    result.rows.truncate(max_rows);
                    result.truncated = true;
                    result.row_count = max_rows;
                }
                Ok(result)
            }
            FakeExecutor::Fails => Err(ExecError::Database(sqlx::Error::RowNotFound)),
            FakeExecutor::TimesOut => Err(ExecError::Timeout(statement_timeout_ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlq_core::types::ResultColumn;

    fn sample_result(row_count: usize) -> ExecutionResult {
        ExecutionResult {
            columns: vec![ResultColumn {
                name: "id".to_string(),
                data_type: "INT4".to_string(),
            }],
            rows: (0..row_count).map(|i| vec![serde_json::json!(i)]).collect(),
            row_count,
            truncated: false,
        }
    }

    #[tokio::test]
    async fn returns_fixed_result() {
        let executor = FakeExecutor::returning(sample_result(3));
        let result = executor.execute("SELECT id FROM orders", 1000, 100).await.unwrap();
        assert_eq!(result.row_count, 3);
        assert!(!result.truncated);
    }

    #[tokio::test]
    async fn truncates_to_max_rows() {
        let executor = FakeExecutor::returning(sample_result(10));
        let result = executor.execute("SELECT id FROM orders", 1000, 5).await.unwrap();
        assert_eq!(result.row_count, 5);
        assert!(result.truncated);
    }

    #[tokio::test]
    async fn reports_timeout() {
        let executor = FakeExecutor::TimesOut;
        let result = executor.execute("SELECT id FROM orders", 1000, 100).await;
        assert!(matches!(result, Err(ExecError::Timeout(1000))));
    }
}
