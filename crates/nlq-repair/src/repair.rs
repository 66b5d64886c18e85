//! The bounded repair-attempt loop itself: decides whether a failed
//! candidate is worth retrying, builds the next attempt, and tracks the
//! confidence penalty repair accrues (spec §4.9).

use crate::autocorrect::autocorrect_hints;
use crate::delta::render_delta_prompt;
use crate::error::{RepairError, RepairResult};
use nlq_core::config::RepairConfig;
use nlq_core::types::{Candidate, ExplainOutcome, RepairAttempt, RepairContext, SchemaContextPacket, ValidationVerdict};
use nlq_sql::SqlParser;

/// What the repair loop should do next with a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairDecision {
    /// Worth another attempt: an EXPLAIN timeout or a generic SQL error,
    /// both of which a targeted hint can plausibly fix.
    Retry,
    /// Give up — either already executable or blocked in a way repair
    /// can't address (validation blocks are never retried, spec §7).
    GiveUp { reason: String },
}

/// Classifies a candidate's current outcome into a repair decision.
pub fn classify(candidate: &Candidate) -> RepairDecision {
    match &candidate.validation {
        Some(ValidationVerdict::Blocked { reason }) => RepairDecision::GiveUp {
            reason: format!("validation blocked: {reason}"),
        },
        Some(ValidationVerdict::Passed) => match &candidate.explain {
            Some(ExplainOutcome::TimedOut) => RepairDecision::Retry,
            Some(ExplainOutcome::Error { .. }) => RepairDecision::Retry,
            Some(ExplainOutcome::Ok { .. }) => RepairDecision::GiveUp {
                reason: "candidate already executes".to_string(),
            },
            None => RepairDecision::GiveUp {
                reason: "candidate has not been evaluated yet".to_string(),
            },
        },
        None => RepairDecision::GiveUp {
            reason: "candidate has not been validated yet".to_string(),
        },
    }
}

/// True when another attempt is allowed under `config.max_attempts`.
pub fn can_retry(repair_context: &RepairContext, config: &RepairConfig) -> bool {
    repair_context.attempt_count() < config.max_attempts
}

/// Builds the next repair attempt: static autocorrect hints compared
/// against the schema context, rendered into a delta prompt. The caller
/// (the orchestrator) appends `delta_prompt` to the unchanged base prompt,
/// re-invokes the generator, and fills in `outcome_sql` before recording
/// the attempt in the candidate's `RepairContext`.
pub fn build_next_attempt(
    repair_context: &RepairContext,
    candidate: &Candidate,
    schema_context: &SchemaContextPacket,
    config: &RepairConfig,
) -> RepairResult<RepairAttempt> {
    if !can_retry(repair_context, config) {
        return Err(RepairError::AttemptsExhausted(config.max_attempts));
    }

    let attempt_number = repair_context.attempt_count() + 1;
    let parser = SqlParser::postgres();
    let hints = match parser.parse_single(&candidate.normalized_sql) {
        Ok(statement) => autocorrect_hints(&statement, schema_context),
        Err(e) => {
            log::debug!("repair attempt {attempt_number}: candidate SQL failed to parse: {e}");
            Vec::new()
        }
    };
    let delta_prompt = render_delta_prompt(attempt_number, &candidate.normalized_sql, &hints)?;

    Ok(RepairAttempt {
        attempt_number,
        previous_sql: candidate.normalized_sql.clone(),
        hints,
        delta_prompt,
        outcome_sql: None,
    })
}

/// The confidence penalty a candidate accrues after `attempts` repair
/// rounds, consumed by `nlq-eval`'s `repair_penalty` scoring signal.
pub fn confidence_penalty(attempts: usize, config: &RepairConfig) -> f32 {
    attempts as f32 * config.confidence_penalty_per_attempt
}
