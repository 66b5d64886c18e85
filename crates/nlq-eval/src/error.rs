use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("every candidate was rejected by structural validation")]
    NoCandidates,

    #[error("every candidate failed EXPLAIN")]
    ExplainAllFailed,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type EvalResult<T> = Result<T, EvalError>;
