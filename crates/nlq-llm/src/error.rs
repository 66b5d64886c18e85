use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("generator worker unavailable: {0}")]
    GeneratorUnavailable(String),

    #[error("embedding worker unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("worker returned malformed response: {0}")]
    MalformedResponse(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type LlmResult<T> = Result<T, LlmError>;
