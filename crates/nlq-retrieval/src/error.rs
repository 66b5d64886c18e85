use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("catalog error: {0}")]
    Catalog(#[from] nlq_catalog::CatalogError),

    #[error("embedding worker unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("both cosine and BM25 retrieval failed")]
    RetrievalFailed,
}

pub type RetrievalResult<T> = Result<T, RetrievalError>;
