#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("statement timed out after {0}ms")]
    Timeout(u64),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type ExecResult<T> = Result<T, ExecError>;
