//! Pulls every table and column identifier a statement references, for
//! allow-list enforcement and the reranker's schema-adherence signal.

use sqlparser::ast::{
    Expr, GroupByExpr, JoinConstraint, JoinOperator, Query, Select, SelectItem, SetExpr, Statement,
    TableFactor,
};
use std::collections::HashSet;

/// Every CTE name introduced by a `WITH` clause, so they can be excluded
/// from "real table" references.
pub fn cte_names(query: &Query) -> HashSet<String> {
    let mut names = HashSet::new();
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            names.insert(normalize_table_name(&cte.alias.name.value));
        }
    }
    names
}

/// All table names referenced anywhere in `statement`'s `FROM`/`JOIN`
/// clauses, lowercase-normalized, excluding CTE aliases.
pub fn extract_table_references(statement: &Statement) -> HashSet<String> {
    let mut refs = HashSet::new();
    if let Statement::Query(query) = statement {
        let ctes = cte_names(query);
        collect_from_query(query, &mut refs);
        for cte in &ctes {
            refs.remove(cte);
        }
    }
    refs
}

fn collect_from_query(query: &Query, refs: &mut HashSet<String>) {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            collect_from_query(&cte.query, refs);
        }
    }
    collect_from_set_expr(&query.body, refs);
}

fn collect_from_set_expr(expr: &SetExpr, refs: &mut HashSet<String>) {
    match expr {
        SetExpr::Select(select) => collect_from_select(select, refs),
        SetExpr::Query(query) => collect_from_query(query, refs),
        SetExpr::SetOperation { left, right, .. } => {
            collect_from_set_expr(left, refs);
            collect_from_set_expr(right, refs);
        }
        _ => {}
    }
}

fn collect_from_select(select: &Select, refs: &mut HashSet<String>) {
    for table_with_joins in &select.from {
        collect_from_table_factor(&table_with_joins.relation, refs);
        for join in &table_with_joins.joins {
            collect_from_table_factor(&join.relation, refs);
        }
    }
}

fn collect_from_table_factor(factor: &TableFactor, refs: &mut HashSet<String>) {
    match factor {
        TableFactor::Table { name, .. } => {
            refs.insert(normalize_table_name(&name.to_string()));
        }
        TableFactor::Derived { subquery, .. } => {
            collect_from_query(subquery, refs);
        }
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => {
            collect_from_table_factor(&table_with_joins.relation, refs);
            for join in &table_with_joins.joins {
                collect_from_table_factor(&join.relation, refs);
            }
        }
        _ => {}
    }
}

/// Strips a schema qualifier and lowercases, so `public.Orders` and `orders`
/// compare equal.
pub fn normalize_table_name(raw: &str) -> String {
    raw.rsplit('.').next().unwrap_or(raw).trim_matches('"').to_lowercase()
}

/// Every bare column name referenced in `statement`'s projection, WHERE,
/// GROUP BY, HAVING, and JOIN ON clauses, lowercase-normalized. Only the
/// final identifier segment is kept (`o.id` and `id` both yield `id`):
/// schema-adherence only needs to know whether a name exists somewhere in
/// context, not which table/alias it resolves to.
pub fn extract_column_references(statement: &Statement) -> HashSet<String> {
    let mut refs = HashSet::new();
    if let Statement::Query(query) = statement {
        collect_columns_from_query(query, &mut refs);
    }
    refs
}

fn collect_columns_from_query(query: &Query, refs: &mut HashSet<String>) {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            collect_columns_from_query(&cte.query, refs);
        }
    }
    collect_columns_from_set_expr(&query.body, refs);
}

fn collect_columns_from_set_expr(expr: &SetExpr, refs: &mut HashSet<String>) {
    match expr {
        SetExpr::Select(select) => collect_columns_from_select(select, refs),
        SetExpr::Query(query) => collect_columns_from_query(query, refs),
        SetExpr::SetOperation { left, right, .. } => {
            collect_columns_from_set_expr(left, refs);
            collect_columns_from_set_expr(right, refs);
        }
        _ => {}
    }
}

fn collect_columns_from_select(select: &Select, refs: &mut HashSet<String>) {
    for item in &select.projection {
        match item {
            SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
                collect_columns_from_expr(expr, refs);
            }
            _ => {}
        }
    }

    if let Some(selection) = &select.selection {
        collect_columns_from_expr(selection, refs);
    }

    match &select.group_by {
        GroupByExpr::Expressions(exprs, _) => {
            for expr in exprs {
                collect_columns_from_expr(expr, refs);
            }
        }
        GroupByExpr::All(_) => {}
    }

    if let Some(having) = &select.having {
        collect_columns_from_expr(having, refs);
    }

    for table_with_joins in &select.from {
        for join in &table_with_joins.joins {
            let constraint = match &join.join_operator {
                JoinOperator::Inner(c)
                | JoinOperator::LeftOuter(c)
                | JoinOperator::RightOuter(c)
                | JoinOperator::FullOuter(c) => Some(c),
                _ => None,
            };
            if let Some(JoinConstraint::On(expr)) = constraint {
                collect_columns_from_expr(expr, refs);
            }
        }
    }
}

fn collect_columns_from_expr(expr: &Expr, refs: &mut HashSet<String>) {
    match expr {
        Expr::Identifier(ident) => {
            refs.insert(ident.value.to_lowercase());
        }
        Expr::CompoundIdentifier(parts) => {
            if let Some(last) = parts.last() {
                refs.insert(last.value.to_lowercase());
            }
        }
        Expr::BinaryOp { left, right, .. } => {
            collect_columns_from_expr(left, refs);
            collect_columns_from_expr(right, refs);
        }
        Expr::UnaryOp { expr, .. } | Expr::Nested(expr) | Expr::IsNull(expr) | Expr::IsNotNull(expr) => {
            collect_columns_from_expr(expr, refs);
        }
        Expr::Between { expr, low, high, .. } => {
            collect_columns_from_expr(expr, refs);
            collect_columns_from_expr(low, refs);
            collect_columns_from_expr(high, refs);
        }
        Expr::InList { expr, list, .. } => {
            collect_columns_from_expr(expr, refs);
            for item in list {
                collect_columns_from_expr(item, refs);
            }
        }
        Expr::Function(func) => {
            if let sqlparser::ast::FunctionArguments::List(arg_list) = &func.args {
                for arg in &arg_list.args {
                    if let sqlparser::ast::FunctionArg::Unnamed(sqlparser::ast::FunctionArgExpr::Expr(inner)) = arg {
                        collect_columns_from_expr(inner, refs);
                    }
                }
            }
        }
        Expr::Cast { expr, .. } => {
            collect_columns_from_expr(expr, refs);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SqlParser;

    fn references(sql: &str) -> HashSet<String> {
        let parser = SqlParser::postgres();
        let statement = parser.parse_single(sql).unwrap();
        extract_table_references(&statement)
    }

    #[test]
    fn extracts_single_table() {
        let refs = references("SELECT id FROM orders");
        assert_eq!(refs, HashSet::from(["orders".to_string()]));
    }

    #[test]
    fn extracts_joined_tables() {
        let refs = references("SELECT o.id FROM orders o JOIN customers c ON o.customer_id = c.id");
        assert_eq!(refs, HashSet::from(["orders".to_string(), "customers".to_string()]));
    }

    #[test]
    fn excludes_cte_aliases() {
        let refs = references("WITH recent AS (SELECT id FROM orders) SELECT id FROM recent");
        assert_eq!(refs, HashSet::from(["orders".to_string()]));
    }

    #[test]
    fn normalizes_schema_qualified_names() {
        assert_eq!(normalize_table_name("public.orders"), "orders");
        assert_eq!(normalize_table_name("\"Orders\""), "orders");
    }

    fn column_references(sql: &str) -> HashSet<String> {
        let parser = SqlParser::postgres();
        let statement = parser.parse_single(sql).unwrap();
        extract_column_references(&statement)
    }

    #[test]
    fn extracts_projection_and_where_columns() {
        let refs = column_references("SELECT id, total FROM orders WHERE status = 'paid'");
        assert_eq!(refs, HashSet::from(["id".to_string(), "total".to_string(), "status".to_string()]));
    }

    #[test]
    fn extracts_qualified_column_by_final_segment() {
        let refs = column_references("SELECT o.id FROM orders o JOIN customers c ON o.customer_id = c.id");
        assert!(refs.contains("id"));
        assert!(refs.contains("customer_id"));
    }

    #[test]
    fn extracts_group_by_and_having_columns() {
        let refs = column_references(
            "SELECT region, COUNT(*) FROM orders GROUP BY region HAVING COUNT(*) > 10",
        );
        assert!(refs.contains("region"));
    }
}
