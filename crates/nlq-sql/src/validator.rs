//! Structural validation: the first gate a candidate must clear before it is
//! ever EXPLAINed or scored (spec §4.8 step 1). Generalizes the teacher's
//! "reject DML" validator into the fuller blocklist this orchestrator needs,
//! since candidates here come from a generative model rather than a
//! version-controlled model file.

use crate::extractor::extract_table_references;
use crate::parser::SqlParser;
use sqlparser::ast::{Expr, FunctionArguments, Select, SetExpr, Statement};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    NotASelect,
    MultipleStatements,
    DisallowedKeyword(String),
    DisallowedFunction(String),
    TableNotInContext(String),
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::NotASelect => write!(f, "statement is not a SELECT"),
            Violation::MultipleStatements => write!(f, "candidate contains more than one statement"),
            Violation::DisallowedKeyword(k) => write!(f, "disallowed keyword: {k}"),
            Violation::DisallowedFunction(func) => write!(f, "disallowed function: {func}"),
            Violation::TableNotInContext(table) => write!(f, "table not in schema context: {table}"),
        }
    }
}

/// Functions with no place in a read-only analytical query: session/admin
/// functions, arbitrary file or network access, and anything that mutates
/// state as a side effect of evaluation.
const DISALLOWED_FUNCTIONS: &[&str] = &[
    "pg_sleep",
    "pg_terminate_backend",
    "pg_cancel_backend",
    "dblink",
    "dblink_exec",
    "lo_import",
    "lo_export",
    "pg_read_file",
    "pg_ls_dir",
    "set_config",
    "nextval",
    "setval",
];

/// Validates `statement` is a single read-only `SELECT` referencing only
/// tables present in `allowed_tables`.
pub fn validate_statement(statement: &Statement, allowed_tables: &[String]) -> Vec<Violation> {
    let mut violations = Vec::new();

    let query = match statement {
        Statement::Query(query) => query,
        other => {
            violations.push(Violation::NotASelect);
            log::debug!("structural validation rejected non-SELECT statement: {other}");
            return violations;
        }
    };

    if let SetExpr::Select(select) = query.body.as_ref() {
        check_select(select, &mut violations);
    }

    for function_name in referenced_functions(statement) {
        if DISALLOWED_FUNCTIONS.contains(&function_name.to_lowercase().as_str()) {
            violations.push(Violation::DisallowedFunction(function_name));
        }
    }

    let allowed_lower: std::collections::HashSet<String> =
        allowed_tables.iter().map(|t| t.to_lowercase()).collect();
    for table in extract_table_references(statement) {
        if !allowed_lower.contains(&table) {
            violations.push(Violation::TableNotInContext(table));
        }
    }

    violations
}

/// Validates a raw SQL string end to end: parse, single-statement
/// enforcement, then [`validate_statement`].
pub fn validate_sql(parser: &SqlParser, sql: &str, allowed_tables: &[String]) -> Vec<Violation> {
    let statements = match parser.parse(sql) {
        Ok(s) => s,
        Err(_) => return vec![Violation::NotASelect],
    };
    if statements.len() != 1 {
        return vec![Violation::MultipleStatements];
    }
    validate_statement(&statements[0], allowed_tables)
}

fn check_select(select: &Select, violations: &mut Vec<Violation>) {
    if select.into.is_some() {
        violations.push(Violation::DisallowedKeyword("INTO".to_string()));
    }
}

fn referenced_functions(statement: &Statement) -> Vec<String> {
    let mut names = Vec::new();
    if let Statement::Query(query) = statement {
        if let SetExpr::Select(select) = query.body.as_ref() {
            for item in &select.projection {
                collect_function_names(item, &mut names);
            }
        }
    }
    names
}

fn collect_function_names(item: &sqlparser::ast::SelectItem, names: &mut Vec<String>) {
    use sqlparser::ast::SelectItem;
    let expr = match item {
        SelectItem::UnnamedExpr(e) | SelectItem::ExprWithAlias { expr: e, .. } => e,
        _ => return,
    };
    walk_expr_for_functions(expr, names);
}

fn walk_expr_for_functions(expr: &Expr, names: &mut Vec<String>) {
    if let Expr::Function(func) = expr {
        names.push(func.name.to_string());
        if let FunctionArguments::List(list) = &func.args {
            for arg in &list.args {
                if let sqlparser::ast::FunctionArg::Unnamed(sqlparser::ast::FunctionArgExpr::Expr(e))
                | sqlparser::ast::FunctionArg::Named {
                    arg: sqlparser::ast::FunctionArgExpr::Expr(e),
                    ..
                } = arg
                {
                    walk_expr_for_functions(e, names);
                }
            }
        }
    }
}

/// Is `statement` a plain `SELECT` (no INSERT/UPDATE/DELETE/DDL)? Used as a
/// cheap first check before the fuller [`validate_statement`] pass.
pub fn is_select_statement(statement: &Statement) -> bool {
    matches!(statement, Statement::Query(_))
}

/// Appends a `LIMIT` clause when the statement doesn't already have one, so
/// a candidate can never run unbounded against the target database. Works
/// on the statement's own `Query::limit`, not a text search, so a `LIMIT`
/// inside a subquery or CTE doesn't fool it into skipping the outer clause.
pub fn ensure_limit(sql: &str, statement: &Statement, max_limit: u64) -> String {
    if let Statement::Query(query) = statement {
        if query.limit.is_some() {
            return sql.to_string();
        }
    }
    format!("{} LIMIT {}", sql.trim_end().trim_end_matches(';'), max_limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["orders".to_string(), "customers".to_string()]
    }

    #[test]
    fn accepts_select_over_allowed_tables() {
        let parser = SqlParser::postgres();
        let violations = validate_sql(&parser, "SELECT id FROM orders", &allowed());
        assert!(violations.is_empty());
    }

    #[test]
    fn rejects_delete_statement() {
        let parser = SqlParser::postgres();
        let violations = validate_sql(&parser, "DELETE FROM orders", &allowed());
        assert_eq!(violations, vec![Violation::NotASelect]);
    }

    #[test]
    fn rejects_table_outside_context() {
        let parser = SqlParser::postgres();
        let violations = validate_sql(&parser, "SELECT id FROM secret_table", &allowed());
        assert!(violations.contains(&Violation::TableNotInContext("secret_table".to_string())));
    }

    #[test]
    fn rejects_disallowed_function() {
        let parser = SqlParser::postgres();
        let violations = validate_sql(&parser, "SELECT pg_sleep(5) FROM orders", &allowed());
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::DisallowedFunction(f) if f == "pg_sleep")));
    }

    #[test]
    fn ensure_limit_appends_when_absent() {
        let parser = SqlParser::postgres();
        let statement = parser.parse_single("SELECT id FROM orders").unwrap();
        let result = ensure_limit("SELECT id FROM orders", &statement, 1000);
        assert_eq!(result, "SELECT id FROM orders LIMIT 1000");
    }

    #[test]
    fn ensure_limit_leaves_existing_limit_untouched() {
        let parser = SqlParser::postgres();
        let sql = "SELECT id FROM orders LIMIT 10";
        let statement = parser.parse_single(sql).unwrap();
        let result = ensure_limit(sql, &statement, 1000);
        assert_eq!(result, sql);
    }

    #[test]
    fn rejects_multiple_statements() {
        let parser = SqlParser::postgres();
        let violations = validate_sql(&parser, "SELECT 1 FROM orders; SELECT 2 FROM orders", &allowed());
        assert_eq!(violations, vec![Violation::MultipleStatements]);
    }
}
