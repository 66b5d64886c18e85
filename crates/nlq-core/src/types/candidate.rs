//! The candidate type threaded through generation, evaluation, and repair
//! (spec §4.7/§4.8).

use crate::types::lint::LintReport;
use serde::{Deserialize, Serialize};

/// Verdict from structural validation (spec §4.8 step 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ValidationVerdict {
    Passed,
    /// Blocked outright; no repair is attempted for these (§7 `ValidationBlocked`).
    Blocked { reason: String },
}

/// Outcome of running `EXPLAIN (FORMAT JSON)` against a candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ExplainOutcome {
    Ok {
        estimated_rows: Option<f64>,
        estimated_cost: Option<f64>,
        plan_json: serde_json::Value,
    },
    TimedOut,
    Error {
        message: String,
    },
}

impl ExplainOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ExplainOutcome::Ok { .. })
    }
}

/// The deterministic score breakdown for one candidate (spec §4.8 step 4),
/// each field an independently-computed pure-function signal summed into
/// `total`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub schema_adherence: f32,
    pub join_skeleton_match: f32,
    pub result_shape: f32,
    pub lint_penalty: f32,
    pub value_verification: f32,
    pub repair_penalty: f32,
    /// Deterministic question-alignment bonus: ORDER BY+LIMIT for a
    /// superlative question, GROUP BY for a "how many/group by" one,
    /// DISTINCT for a uniqueness question, a JOIN for a relationship one.
    pub question_alignment: f32,
    pub total: f32,
}

impl ScoreBreakdown {
    #[allow(clippy::too_many_arguments)]
    pub fn sum(
        schema_adherence: f32,
        join_skeleton_match: f32,
        result_shape: f32,
        lint_penalty: f32,
        value_verification: f32,
        repair_penalty: f32,
        question_alignment: f32,
    ) -> Self {
        let total = schema_adherence
            + join_skeleton_match
            + result_shape
            - lint_penalty
            + value_verification
            - repair_penalty
            + question_alignment;
        Self {
            schema_adherence,
            join_skeleton_match,
            result_shape,
            lint_penalty,
            value_verification,
            repair_penalty,
            question_alignment,
            total,
        }
    }
}

/// One candidate SQL statement as it flows through generation, evaluation
/// and (possibly) repair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// The raw text returned by the generator, before fence-stripping.
    pub raw_sql: String,
    /// Fence-stripped, dialect-normalized SQL actually evaluated/executed.
    pub normalized_sql: String,
    pub validation: Option<ValidationVerdict>,
    pub lint: Option<LintReport>,
    pub explain: Option<ExplainOutcome>,
    pub score: Option<ScoreBreakdown>,
    /// Number of repair attempts applied to reach `normalized_sql`.
    pub repair_attempts: usize,
}

impl Candidate {
    pub fn new(raw_sql: impl Into<String>) -> Self {
        let raw_sql = raw_sql.into();
        Self {
            normalized_sql: raw_sql.clone(),
            raw_sql,
            validation: None,
            lint: None,
            explain: None,
            score: None,
            repair_attempts: 0,
        }
    }

    pub fn is_executable(&self) -> bool {
        matches!(self.validation, Some(ValidationVerdict::Passed))
            && self.explain.as_ref().is_some_and(ExplainOutcome::is_ok)
    }
}
