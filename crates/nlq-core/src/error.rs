//! Error taxonomy for the orchestrator (spec §7).

use thiserror::Error;

/// The kind of a structured orchestrator error, as surfaced to the caller.
///
/// Mirrors the propagation policy table: each kind carries its own retry
/// semantics upstream of this enum (in the stage that raises it); by the
/// time an error reaches [`OrchestratorError`] it is final for the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Catalog store unreachable. Fatal, no retry.
    CatalogUnavailable,
    /// Embedding worker unreachable after one retry; retrieval degraded to BM25-only
    /// and failed anyway.
    EmbeddingUnavailable,
    /// Both cosine and BM25 retrieval channels failed.
    RetrievalFailed,
    /// Generator worker unreachable. Fatal for the query.
    GeneratorUnavailable,
    /// Every generated candidate was rejected by structural validation.
    NoCandidates,
    /// Every candidate failed EXPLAIN.
    ExplainAllFailed,
    /// Repair attempts exhausted with no executable SQL.
    RepairExhausted,
    /// `statement_timeout` was hit during execution.
    ExecutionTimeout,
    /// SQL execution failed (not a timeout).
    ExecutionFailed,
    /// Connection, permission, or resource error.
    InfrastructureError,
    /// The validator blocked a candidate outright (no repair attempted).
    ValidationBlocked,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Top-level orchestrator error.
///
/// Carries a [`ErrorKind`], a human message, and whatever trace was built
/// before the failure so the caller can inspect partial progress.
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct OrchestratorError {
    pub kind: ErrorKind,
    pub message: String,
    /// Best-effort trace accumulated before the failure (JSON, opaque to this crate).
    pub partial_trace: Option<serde_json::Value>,
}

impl OrchestratorError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            partial_trace: None,
        }
    }

    pub fn with_trace(mut self, trace: serde_json::Value) -> Self {
        self.partial_trace = Some(trace);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Result alias for orchestrator-level operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Configuration errors, separate from the runtime taxonomy above.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {path}")]
    NotFound { path: String },

    #[error("failed to parse configuration: {message}")]
    ParseError { message: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
