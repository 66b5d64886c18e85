use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("table not found in catalog: {0}")]
    TableNotFound(String),

    #[error("rebuild aborted: {0}")]
    RebuildFailed(String),
}

impl CatalogError {
    /// True for connection-level failures the orchestrator should surface as
    /// `CatalogUnavailable` without retrying.
    pub fn is_unavailable(&self) -> bool {
        match self {
            CatalogError::Unavailable(_) => true,
            CatalogError::Database(e) => matches!(
                e,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
            ),
            _ => false,
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
