//! Caller-facing types for the `answer()` entry point (spec §6).

use crate::error::ErrorKind;
use crate::types::candidate::Candidate;
use crate::types::context::SchemaContextPacket;
use crate::types::link::SchemaLinkBundle;
use crate::types::plan::JoinPlan;
use serde::{Deserialize, Serialize};

/// A natural-language question plus the database it should be answered against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub database_id: String,
}

/// Per-call options controlling trace verbosity and optional stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerOptions {
    /// When true, `AnswerOutcome::trace` is populated with the full pipeline trace.
    pub include_trace: bool,
}

/// A single column in the executed result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultColumn {
    pub name: String,
    pub data_type: String,
}

/// The decoded result of executing the final SQL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub columns: Vec<ResultColumn>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
    pub truncated: bool,
}

/// Best-effort pipeline trace, populated when requested via [`AnswerOptions`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    pub context: Option<SchemaContextPacket>,
    pub link_bundle: Option<SchemaLinkBundle>,
    pub join_plan: Option<JoinPlan>,
    pub candidates: Vec<Candidate>,
    pub selected_candidate_index: Option<usize>,
}

/// The successful result of `answer()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub sql: String,
    pub result: ExecutionResult,
    pub trace: Option<Trace>,
}

/// Lightweight, serializable mirror of [`crate::error::OrchestratorError`]
/// for callers that only need the machine-readable kind and message (e.g.
/// the HTTP front end's JSON error body).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerError {
    pub kind: ErrorKind,
    pub message: String,
    pub partial_trace: Option<Trace>,
}
