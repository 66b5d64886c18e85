//! Coded lint passes run over a structurally-valid candidate, before
//! EXPLAIN. Mirrors the teacher's `DiagnosticCode`/`Severity`/`Diagnostic`
//! shape (now shared via `nlq_core::types::lint`), with a dedicated code
//! range owned by this crate.

use nlq_core::types::lint::{Diagnostic, DiagnosticCode, LintReport, Severity};
use regex::Regex;
use sqlparser::ast::{
    Expr, FunctionArguments, GroupByExpr, JoinConstraint, JoinOperator, Select, SetExpr,
    Statement, TableFactor,
};
use std::sync::OnceLock;

const PASS_NAME: &str = "nlq-sql::lint";

/// Runs every lint rule over `sql` (raw, pre-normalization text) and the
/// parsed `statement`, returning the union of findings.
pub fn lint(sql: &str, statement: Option<&Statement>) -> LintReport {
    let mut diagnostics = Vec::new();

    diagnostics.extend(check_trailing_comma(sql));
    diagnostics.extend(check_unbalanced_parens(sql));
    diagnostics.extend(check_unclosed_quote(sql));

    if let Some(Statement::Query(query)) = statement {
        if let SetExpr::Select(select) = query.body.as_ref() {
            diagnostics.extend(check_select_star(select));
            diagnostics.extend(check_missing_group_by(select));
            diagnostics.extend(check_having_without_group_by(select));
            diagnostics.extend(check_implicit_cross_join(select));
            diagnostics.extend(check_join_without_on(select));
            diagnostics.extend(check_ambiguous_column(select));
        }
    }

    LintReport { diagnostics }
}

fn trailing_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",\s*(FROM|WHERE|GROUP BY|ORDER BY|HAVING|\))").unwrap())
}

fn check_trailing_comma(sql: &str) -> Vec<Diagnostic> {
    let upper = sql.to_uppercase();
    if trailing_comma_re().is_match(&upper) {
        vec![Diagnostic::new(
            DiagnosticCode::L006TrailingComma,
            Severity::Error,
            "trailing comma before a clause boundary",
            PASS_NAME,
        )]
    } else {
        Vec::new()
    }
}

fn check_unbalanced_parens(sql: &str) -> Vec<Diagnostic> {
    let mut depth = 0i32;
    let mut in_string = false;
    for ch in sql.chars() {
        match ch {
            '\'' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            break;
        }
    }
    if depth != 0 {
        vec![Diagnostic::new(
            DiagnosticCode::L007UnbalancedParens,
            Severity::Error,
            "unbalanced parentheses",
            PASS_NAME,
        )]
    } else {
        Vec::new()
    }
}

fn check_unclosed_quote(sql: &str) -> Vec<Diagnostic> {
    let quote_count = sql.chars().filter(|c| *c == '\'').count();
    if quote_count % 2 != 0 {
        vec![Diagnostic::new(
            DiagnosticCode::L008UnclosedQuote,
            Severity::Error,
            "unclosed string literal",
            PASS_NAME,
        )]
    } else {
        Vec::new()
    }
}

fn check_select_star(select: &Select) -> Vec<Diagnostic> {
    use sqlparser::ast::SelectItem;
    if select
        .projection
        .iter()
        .any(|item| matches!(item, SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..)))
    {
        vec![Diagnostic::new(
            DiagnosticCode::L001SelectStar,
            Severity::Warning,
            "SELECT * used instead of an explicit column list",
            PASS_NAME,
        )
        .with_hint("name the columns the question actually needs")]
    } else {
        Vec::new()
    }
}

fn has_aggregate_call(select: &Select) -> bool {
    const AGGREGATES: &[&str] = &["count", "sum", "avg", "min", "max"];
    use sqlparser::ast::SelectItem;
    select.projection.iter().any(|item| {
        let expr = match item {
            SelectItem::UnnamedExpr(e) | SelectItem::ExprWithAlias { expr: e, .. } => e,
            _ => return false,
        };
        expr_calls_any(expr, AGGREGATES)
    })
}

fn expr_calls_any(expr: &Expr, names: &[&str]) -> bool {
    match expr {
        Expr::Function(func) => {
            let fname = func.name.to_string().to_lowercase();
            if names.contains(&fname.as_str()) {
                return true;
            }
            if let FunctionArguments::List(list) = &func.args {
                for arg in &list.args {
                    if let sqlparser::ast::FunctionArg::Unnamed(
                        sqlparser::ast::FunctionArgExpr::Expr(inner),
                    ) = arg
                    {
                        if expr_calls_any(inner, names) {
                            return true;
                        }
                    }
                }
            }
            false
        }
        Expr::BinaryOp { left, right, .. } => expr_calls_any(left, names) || expr_calls_any(right, names),
        _ => false,
    }
}

fn non_aggregate_plain_columns(select: &Select) -> bool {
    use sqlparser::ast::SelectItem;
    select.projection.iter().any(|item| {
        let expr = match item {
            SelectItem::UnnamedExpr(e) | SelectItem::ExprWithAlias { expr: e, .. } => e,
            _ => return false,
        };
        matches!(expr, Expr::Identifier(_) | Expr::CompoundIdentifier(_))
    })
}

fn check_missing_group_by(select: &Select) -> Vec<Diagnostic> {
    let group_by_empty = matches!(&select.group_by, GroupByExpr::Expressions(exprs, _) if exprs.is_empty())
        || matches!(&select.group_by, GroupByExpr::All(_));
    if has_aggregate_call(select) && non_aggregate_plain_columns(select) && group_by_empty {
        vec![Diagnostic::new(
            DiagnosticCode::L002MissingGroupBy,
            Severity::Error,
            "aggregate function mixed with ungrouped columns",
            PASS_NAME,
        )
        .with_hint("add a GROUP BY covering every non-aggregated column")]
    } else {
        Vec::new()
    }
}

fn check_having_without_group_by(select: &Select) -> Vec<Diagnostic> {
    let group_by_empty = matches!(&select.group_by, GroupByExpr::Expressions(exprs, _) if exprs.is_empty());
    if select.having.is_some() && group_by_empty {
        vec![Diagnostic::new(
            DiagnosticCode::L005HavingWithoutGroupBy,
            Severity::Warning,
            "HAVING used without a GROUP BY",
            PASS_NAME,
        )]
    } else {
        Vec::new()
    }
}

fn check_implicit_cross_join(select: &Select) -> Vec<Diagnostic> {
    if select.from.len() > 1 {
        vec![Diagnostic::new(
            DiagnosticCode::L004ImplicitCrossJoin,
            Severity::Warning,
            "comma-separated FROM list forms an implicit cross join",
            PASS_NAME,
        )
        .with_hint("use an explicit JOIN with an ON clause")]
    } else {
        Vec::new()
    }
}

fn check_join_without_on(select: &Select) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for table_with_joins in &select.from {
        for join in &table_with_joins.joins {
            let missing = match &join.join_operator {
                JoinOperator::Inner(JoinConstraint::None)
                | JoinOperator::LeftOuter(JoinConstraint::None)
                | JoinOperator::RightOuter(JoinConstraint::None)
                | JoinOperator::FullOuter(JoinConstraint::None) => true,
                _ => false,
            };
            if missing {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::L009JoinWithoutOn,
                        Severity::Error,
                        "JOIN without an ON predicate",
                        PASS_NAME,
                    )
                    .with_hint("add an ON clause naming the join columns"),
                );
            }
        }
    }
    diagnostics
}

fn collect_aliases(select: &Select) -> Vec<String> {
    let mut aliases = Vec::new();
    for table_with_joins in &select.from {
        collect_alias_from_factor(&table_with_joins.relation, &mut aliases);
        for join in &table_with_joins.joins {
            collect_alias_from_factor(&join.relation, &mut aliases);
        }
    }
    aliases
}

fn collect_alias_from_factor(factor: &TableFactor, aliases: &mut Vec<String>) {
    match factor {
        TableFactor::Table { name, alias, .. } => {
            let effective = alias
                .as_ref()
                .map(|a| a.name.value.clone())
                .unwrap_or_else(|| name.to_string());
            aliases.push(effective.to_lowercase());
        }
        TableFactor::Derived { alias, .. } => {
            if let Some(alias) = alias {
                aliases.push(alias.name.value.to_lowercase());
            }
        }
        _ => {}
    }
}

fn check_ambiguous_column(select: &Select) -> Vec<Diagnostic> {
    use sqlparser::ast::SelectItem;
    let table_count = select.from.iter().map(|f| 1 + f.joins.len()).sum::<usize>();
    if table_count < 2 {
        return Vec::new();
    }
    let mut diagnostics = Vec::new();
    for item in &select.projection {
        if let SelectItem::UnnamedExpr(Expr::Identifier(ident)) = item {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::L003AmbiguousColumn,
                    Severity::Warning,
                    format!("unqualified column '{}' with {table_count} tables in scope", ident.value),
                    PASS_NAME,
                )
                .with_hint("qualify the column with its table or alias"),
            );
        }
    }
    diagnostics
}

/// Flags a reference to an alias never introduced by the statement's
/// `FROM`/`JOIN` clauses. Exposed separately because it needs a column
/// reference (not just the `Select`), which callers typically have from
/// `nlq-repair`'s autocorrect pass.
pub fn check_undefined_alias(select: &Select, referenced_alias: &str) -> Option<Diagnostic> {
    let aliases = collect_aliases(select);
    if aliases.iter().any(|a| a == &referenced_alias.to_lowercase()) {
        None
    } else {
        Some(
            Diagnostic::new(
                DiagnosticCode::L010UndefinedAlias,
                Severity::Error,
                format!("reference to undefined alias '{referenced_alias}'"),
                PASS_NAME,
            )
            .with_hint("use one of the aliases introduced in FROM/JOIN"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SqlParser;

    fn lint_sql(sql: &str) -> LintReport {
        let parser = SqlParser::postgres();
        let statement = parser.parse_single(sql).ok();
        lint(sql, statement.as_ref())
    }

    #[test]
    fn flags_select_star() {
        let report = lint_sql("SELECT * FROM orders");
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::L001SelectStar));
    }

    #[test]
    fn flags_missing_group_by() {
        let report = lint_sql("SELECT customer_id, COUNT(*) FROM orders");
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::L002MissingGroupBy));
    }

    #[test]
    fn flags_having_without_group_by() {
        let report = lint_sql("SELECT COUNT(*) FROM orders HAVING COUNT(*) > 1");
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::L005HavingWithoutGroupBy));
    }

    #[test]
    fn flags_implicit_cross_join() {
        let report = lint_sql("SELECT orders.id FROM orders, customers");
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::L004ImplicitCrossJoin));
    }

    #[test]
    fn flags_join_without_on() {
        let report = lint_sql("SELECT o.id FROM orders o JOIN customers c");
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::L009JoinWithoutOn));
    }

    #[test]
    fn clean_query_has_no_diagnostics() {
        let report = lint_sql(
            "SELECT o.id, c.name FROM orders o JOIN customers c ON o.customer_id = c.id",
        );
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn flags_unbalanced_parens_on_raw_text() {
        let report = lint("SELECT COUNT(id FROM orders", None);
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::L007UnbalancedParens));
    }
}
