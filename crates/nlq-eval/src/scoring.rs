//! Deterministic scoring: each signal below is an independent pure function
//! over the candidate and its context, summed by the caller into a
//! [`nlq_core::types::ScoreBreakdown`]. Per spec §9's design note, keeping
//! these orthogonal and pure makes each one independently testable without
//! a generator or database in the loop.

use nlq_core::types::{JoinSkeleton, LintReport};
use sqlparser::ast::{Expr, FunctionArguments, Select, SelectItem, SetExpr, Statement};
use std::collections::HashSet;

/// Fraction of the candidate's referenced tables and columns that are
/// actually present in the schema context packet, weighted 0.4 tables / 0.6
/// columns (spec §4.8 "Schema adherence") — a hallucinated column is a more
/// specific failure than a hallucinated table, so it carries more weight.
pub fn schema_adherence(
    candidate_tables: &HashSet<String>,
    context_tables: &HashSet<String>,
    candidate_columns: &HashSet<String>,
    context_columns: &HashSet<String>,
) -> f32 {
    if candidate_tables.is_empty() && candidate_columns.is_empty() {
        return 0.0;
    }
    let table_ratio = match_ratio(candidate_tables, context_tables);
    let column_ratio = match_ratio(candidate_columns, context_columns);
    0.4 * table_ratio + 0.6 * column_ratio
}

fn match_ratio(candidate: &HashSet<String>, context: &HashSet<String>) -> f32 {
    if candidate.is_empty() {
        return 1.0;
    }
    candidate.iter().filter(|name| context.contains(*name)).count() as f32 / candidate.len() as f32
}

/// How closely the candidate's table set lines up with the planner's chosen
/// join skeleton: 1.0 for an exact match of the table set, scaled down by
/// symmetric difference otherwise. `None` skeleton (no join needed) scores
/// 1.0 when the candidate also touches exactly one table.
pub fn join_skeleton_match(candidate_tables: &HashSet<String>, skeleton: &JoinSkeleton) -> f32 {
    let skeleton_tables: HashSet<String> = skeleton.tables_in_order.iter().cloned().collect();
    if skeleton_tables.is_empty() {
        return if candidate_tables.len() <= 1 { 1.0 } else { 0.0 };
    }
    let union_len = candidate_tables.union(&skeleton_tables).count();
    if union_len == 0 {
        return 1.0;
    }
    let intersection_len = candidate_tables.intersection(&skeleton_tables).count();
    intersection_len as f32 / union_len as f32
}

/// Aggregate the question implies, from a handful of surface phrasings.
fn expected_aggregate(question: &str) -> Option<&'static str> {
    let lower = question.to_lowercase();
    if lower.contains("how many") {
        Some("count")
    } else if lower.contains("total") || lower.contains("sum of") {
        Some("sum")
    } else if lower.contains("average") || lower.contains(" avg ") {
        Some("avg")
    } else {
        None
    }
}

/// Result-shape bonus (spec §4.8): a "how many" question wants a COUNT, a
/// "total" question wants a SUM, an "average" question wants an AVG. Scores
/// 1.0 when the candidate's projection calls the expected aggregate, 0.0
/// when the question implies one and the candidate has none, and a neutral
/// 0.5 when the question doesn't imply any particular aggregate.
pub fn result_shape(question: &str, statement: &Statement) -> f32 {
    match expected_aggregate(question) {
        None => 0.5,
        Some(aggregate) => {
            let calls = select_of(statement).is_some_and(|select| calls_aggregate(select, aggregate));
            if calls {
                1.0
            } else {
                0.0
            }
        }
    }
}

fn select_of(statement: &Statement) -> Option<&Select> {
    if let Statement::Query(query) = statement {
        if let SetExpr::Select(select) = query.body.as_ref() {
            return Some(select);
        }
    }
    None
}

fn calls_aggregate(select: &Select, name: &str) -> bool {
    select.projection.iter().any(|item| match item {
        SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => expr_calls(expr, name),
        _ => false,
    })
}

fn expr_calls(expr: &Expr, name: &str) -> bool {
    match expr {
        Expr::Function(func) => {
            if func.name.to_string().eq_ignore_ascii_case(name) {
                return true;
            }
            if let FunctionArguments::List(list) = &func.args {
                for arg in &list.args {
                    if let sqlparser::ast::FunctionArg::Unnamed(sqlparser::ast::FunctionArgExpr::Expr(inner)) = arg {
                        if expr_calls(inner, name) {
                            return true;
                        }
                    }
                }
            }
            false
        }
        Expr::BinaryOp { left, right, .. } => expr_calls(left, name) || expr_calls(right, name),
        _ => false,
    }
}

/// Deterministic question-alignment bonus (spec §4.8): a superlative
/// question ("top", "highest") wants ORDER BY + LIMIT, a counting question
/// ("how many", "per X") wants GROUP BY, a uniqueness question ("unique",
/// "different") wants DISTINCT, and a relationship question ("between X and
/// Y") wants a JOIN. Each applicable signal contributes independently; a
/// question that triggers none of them scores 0.0.
pub fn question_alignment(question: &str, sql: &str, statement: &Statement) -> f32 {
    const SUPERLATIVE: &[&str] = &["top", "most", "highest", "lowest", "largest", "smallest"];
    const COUNTING: &[&str] = &["how many", "per ", "each ", "breakdown"];
    const UNIQUENESS: &[&str] = &["unique", "different", "distinct"];
    const RELATIONSHIP: &[&str] = &["relationship", "associated with", "linked to", " between "];

    let question_lower = question.to_lowercase();
    let sql_upper = sql.to_uppercase();
    let mut score = 0.0;

    if SUPERLATIVE.iter().any(|w| question_lower.contains(w)) {
        if sql_upper.contains("ORDER BY") && sql_upper.contains("LIMIT") {
            score += 1.0 / 3.0;
        }
    }

    if COUNTING.iter().any(|w| question_lower.contains(w)) {
        if select_of(statement).is_some_and(has_group_by) {
            score += 1.0 / 3.0;
        }
    }

    if UNIQUENESS.iter().any(|w| question_lower.contains(w)) {
        if select_of(statement).is_some_and(|select| select.distinct.is_some()) {
            score += 1.0 / 6.0;
        }
    }

    if RELATIONSHIP.iter().any(|w| question_lower.contains(w)) {
        if select_of(statement).is_some_and(has_join) {
            score += 1.0 / 6.0;
        }
    }

    score
}

fn has_group_by(select: &Select) -> bool {
    use sqlparser::ast::GroupByExpr;
    !matches!(&select.group_by, GroupByExpr::Expressions(exprs, _) if exprs.is_empty())
}

fn has_join(select: &Select) -> bool {
    select.from.iter().any(|t| !t.joins.is_empty())
}

/// Penalty proportional to lint severity: each error costs a full point,
/// each warning a quarter point.
pub fn lint_penalty(lint: &LintReport) -> f32 {
    lint.error_count() as f32 * 1.0 + lint.warning_count() as f32 * 0.25
}

/// Penalty proportional to how many repair attempts it took to reach this
/// candidate's final form — a candidate that needed no repair is preferred
/// over one that barely made it through, all else equal.
pub fn repair_penalty(repair_attempts: usize, penalty_per_attempt: f32) -> f32 {
    repair_attempts as f32 * penalty_per_attempt
}

/// Bonus for a candidate whose literal values were spot-checked against the
/// target database and found present (feature-flagged; 0.0 when the check
/// wasn't run).
pub fn value_verification_bonus(verified_count: usize, checked_count: usize) -> f32 {
    if checked_count == 0 {
        0.0
    } else {
        verified_count as f32 / checked_count as f32
    }
}
