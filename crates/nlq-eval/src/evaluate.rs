//! Runs every stage of candidate evaluation in order — structural
//! validation, lint, EXPLAIN, deterministic scoring — and selects the
//! winner (spec §4.8).

use crate::error::{EvalError, EvalResult};
use crate::explain::ExplainClient;
use crate::scoring;
use nlq_core::config::EvalConfig;
use nlq_core::types::{Candidate, JoinPlan, ScoreBreakdown, ValidationVerdict};
use nlq_sql::{ensure_limit, extract_column_references, extract_table_references, lint, validate_statement, SqlParser};
use std::collections::HashSet;

/// Evaluates every candidate in place and returns the index of the winner.
/// Candidates that fail structural validation are marked `Blocked` and
/// excluded from EXPLAIN/scoring but kept in the returned list (the repair
/// loop inspects them for hints).
#[allow(clippy::too_many_arguments)]
pub async fn evaluate_candidates(
    question: &str,
    candidates: &mut [Candidate],
    context_tables: &HashSet<String>,
    context_columns: &HashSet<String>,
    join_plan: &JoinPlan,
    explain_client: &dyn ExplainClient,
    config: &EvalConfig,
    repair_penalty_per_attempt: f32,
) -> EvalResult<usize> {
    let parser = SqlParser::postgres();
    let allowed: Vec<String> = context_tables.iter().cloned().collect();

    let mut any_passed_validation = false;
    let mut any_explain_ok = false;

    for candidate in candidates.iter_mut() {
        let statement = match parser.parse_single(&candidate.normalized_sql) {
            Ok(s) => s,
            Err(e) => {
                candidate.validation = Some(ValidationVerdict::Blocked { reason: e.to_string() });
                continue;
            }
        };

        let violations = validate_statement(&statement, &allowed);
        if !violations.is_empty() {
            let reason = violations.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("; ");
            log::debug!("candidate blocked by structural validation: {reason}");
            candidate.validation = Some(ValidationVerdict::Blocked { reason });
            continue;
        }
        candidate.validation = Some(ValidationVerdict::Passed);
        any_passed_validation = true;

        candidate.normalized_sql = ensure_limit(&candidate.normalized_sql, &statement, config.max_limit);

        let lint_report = lint(&candidate.normalized_sql, Some(&statement));
        candidate.lint = Some(lint_report);

        let explain_outcome = explain_client.explain(&candidate.normalized_sql, config.explain_timeout_ms).await;
        if explain_outcome.is_ok() {
            any_explain_ok = true;
        }
        candidate.explain = Some(explain_outcome);

        let candidate_tables = extract_table_references(&statement);
        let candidate_columns = extract_column_references(&statement);
        let schema_adherence = scoring::schema_adherence(&candidate_tables, context_tables, &candidate_columns, context_columns);
        let join_skeleton_match = scoring::join_skeleton_match(&candidate_tables, &join_plan.best);
        let result_shape = scoring::result_shape(question, &statement);
        let question_alignment = scoring::question_alignment(question, &candidate.normalized_sql, &statement);
        let lint_penalty = scoring::lint_penalty(candidate.lint.as_ref().unwrap());
        let repair_penalty = scoring::repair_penalty(candidate.repair_attempts, repair_penalty_per_attempt);

        candidate.score = Some(ScoreBreakdown::sum(
            schema_adherence,
            join_skeleton_match,
            result_shape,
            lint_penalty,
            0.0,
            repair_penalty,
            question_alignment,
        ));
    }

    if !any_passed_validation {
        return Err(EvalError::NoCandidates);
    }
    if !any_explain_ok {
        return Err(EvalError::ExplainAllFailed);
    }

    select_best(candidates)
}

/// Picks the highest-scoring executable candidate, breaking ties by
/// shortest normalized SQL and then lexical order, so selection never
/// depends on generation or evaluation order.
fn select_best(candidates: &[Candidate]) -> EvalResult<usize> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_executable())
        .max_by(|(_, a), (_, b)| {
            let score_a = a.score.as_ref().map(|s| s.total).unwrap_or(f32::MIN);
            let score_b = b.score.as_ref().map(|s| s.total).unwrap_or(f32::MIN);
            score_a
                .partial_cmp(&score_b)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.normalized_sql.len().cmp(&a.normalized_sql.len()))
                .then_with(|| b.normalized_sql.cmp(&a.normalized_sql))
        })
        .map(|(idx, _)| idx)
        .ok_or(EvalError::ExplainAllFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::FakeExplainClient;
    use nlq_core::types::JoinSkeleton;

    fn context() -> HashSet<String> {
        HashSet::from(["orders".to_string()])
    }

    fn columns() -> HashSet<String> {
        HashSet::from(["id".to_string()])
    }

    fn join_plan() -> JoinPlan {
        JoinPlan {
            best: JoinSkeleton {
                tables_in_order: vec!["orders".to_string()],
                clauses: vec![],
                cost: 0.0,
            },
            alternatives: vec![],
        }
    }

    #[tokio::test]
    async fn selects_the_only_valid_candidate() {
        let mut candidates = vec![Candidate::new("SELECT id FROM orders")];
        let explain = FakeExplainClient::always_ok();
        let config = EvalConfig::default();
        let winner = evaluate_candidates(
            "list orders",
            &mut candidates,
            &context(),
            &columns(),
            &join_plan(),
            &explain,
            &config,
            0.15,
        )
        .await
        .unwrap();
        assert_eq!(winner, 0);
        assert!(candidates[0].is_executable());
    }

    #[tokio::test]
    async fn blocks_candidate_referencing_unknown_table() {
        let mut candidates = vec![Candidate::new("SELECT id FROM secret")];
        let explain = FakeExplainClient::always_ok();
        let config = EvalConfig::default();
        let result = evaluate_candidates(
            "list orders",
            &mut candidates,
            &context(),
            &columns(),
            &join_plan(),
            &explain,
            &config,
            0.15,
        )
        .await;
        assert!(matches!(result, Err(EvalError::NoCandidates)));
    }

    #[tokio::test]
    async fn all_explain_failures_reported() {
        let mut candidates = vec![Candidate::new("SELECT id FROM orders")];
        let explain = FakeExplainClient::always_failing();
        let config = EvalConfig::default();
        let result = evaluate_candidates(
            "list orders",
            &mut candidates,
            &context(),
            &columns(),
            &join_plan(),
            &explain,
            &config,
            0.15,
        )
        .await;
        assert!(matches!(result, Err(EvalError::ExplainAllFailed)));
    }

    #[tokio::test]
    async fn higher_scoring_candidate_wins() {
        let mut candidates = vec![
            Candidate::new("SELECT * FROM orders"),
            Candidate::new("SELECT id FROM orders"),
        ];
        let explain = FakeExplainClient::always_ok();
        let config = EvalConfig::default();
        let winner = evaluate_candidates(
            "list orders",
            &mut candidates,
            &context(),
            &columns(),
            &join_plan(),
            &explain,
            &config,
            0.15,
        )
            .await
            .unwrap();
        assert_eq!(winner, 1, "explicit column list should outscore SELECT *");
    }
}
