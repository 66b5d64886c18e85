use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqlError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("expected a single SELECT statement, got {0}")]
    NotSingleSelect(String),
}

pub type SqlResult<T> = Result<T, SqlError>;
