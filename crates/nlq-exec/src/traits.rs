use crate::error::ExecResult;
use async_trait::async_trait;
use nlq_core::types::ExecutionResult;

/// Pure transport: runs already-validated SQL and decodes the result. No
/// mutation of the SQL itself happens behind this boundary.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, sql: &str, statement_timeout_ms: u64, max_rows: usize) -> ExecResult<ExecutionResult>;
}
