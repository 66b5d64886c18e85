//! Static schema-vs-SQL comparison: resolves every qualified column
//! reference in a candidate to the table its alias names, and flags the
//! ones that don't actually have that column (spec §4.9). Runs on the
//! parsed statement alone — no EXPLAIN error text required, since the
//! schema context packet already has every column name.

use crate::levenshtein::closest_match;
use nlq_core::types::{RepairHint, SchemaContextPacket};
use nlq_sql::normalize_table_name;
use sqlparser::ast::{
    Expr, FunctionArgExpr, FunctionArguments, Select, SetExpr, Statement, TableFactor,
};
use std::collections::{HashMap, HashSet};

/// Maximum edit distance considered a plausible typo rather than a
/// different column entirely.
const MAX_TYPO_DISTANCE: usize = 2;

/// Builds every autocorrect hint this candidate's qualified column
/// references suggest, deduplicated by (table, column).
pub fn autocorrect_hints(statement: &Statement, context: &SchemaContextPacket) -> Vec<RepairHint> {
    let alias_map = collect_alias_map(statement);
    let mut seen = HashSet::new();
    let mut hints = Vec::new();

    for (qualifier, column) in collect_qualified_columns(statement) {
        let Some(qualifier) = qualifier else { continue };
        let table_name = alias_map
            .get(&qualifier.to_lowercase())
            .cloned()
            .unwrap_or_else(|| normalize_table_name(&qualifier));

        let Some(context_table) = context.table(&table_name) else {
            continue;
        };
        if context_table.descriptor.column(&column).is_some() {
            continue;
        }
        if !seen.insert((table_name.clone(), column.clone())) {
            continue;
        }

        let other_tables_with_column: Vec<&str> = context
            .tables
            .iter()
            .filter(|t| !t.descriptor.name.eq_ignore_ascii_case(&table_name))
            .filter(|t| t.descriptor.column(&column).is_some())
            .map(|t| t.descriptor.name.as_str())
            .collect();

        match other_tables_with_column.len() {
            0 => {
                let all_columns: Vec<&str> = context
                    .tables
                    .iter()
                    .flat_map(|t| t.descriptor.columns.iter().map(|c| c.name.as_str()))
                    .collect();
                match closest_match(&column, &all_columns, MAX_TYPO_DISTANCE) {
                    Some((closest, distance)) if distance > 0 => {
                        hints.push(RepairHint::SurgicalWhitelist {
                            original: column,
                            candidates: vec![closest.to_string()],
                        });
                    }
                    _ => {
                        hints.push(RepairHint::PhantomColumn {
                            table: table_name,
                            column,
                        });
                    }
                }
            }
            1 => {
                hints.push(RepairHint::CrossTable {
                    column,
                    wrong_table: table_name,
                    correct_table: other_tables_with_column[0].to_string(),
                });
            }
            _ => {
                let mut candidates: Vec<String> = other_tables_with_column
                    .iter()
                    .map(|t| format!("{t}.{column}"))
                    .collect();
                candidates.sort();
                hints.push(RepairHint::SurgicalWhitelist {
                    original: format!("{table_name}.{column}"),
                    candidates,
                });
            }
        }
    }

    hints
}

/// Maps every table alias (or bare table name when unaliased) to its
/// normalized real table name.
fn collect_alias_map(statement: &Statement) -> HashMap<String, String> {
    let mut map = HashMap::new();
    if let Statement::Query(query) = statement {
        if let SetExpr::Select(select) = query.body.as_ref() {
            for twj in &select.from {
                collect_alias_from_factor(&twj.relation, &mut map);
                for join in &twj.joins {
                    collect_alias_from_factor(&join.relation, &mut map);
                }
            }
        }
    }
    map
}

fn collect_alias_from_factor(factor: &TableFactor, map: &mut HashMap<String, String>) {
    if let TableFactor::Table { name, alias, .. } = factor {
        let real = normalize_table_name(&name.to_string());
        if let Some(alias) = alias {
            map.insert(alias.name.value.to_lowercase(), real.clone());
        }
        map.insert(real.clone(), real);
    }
}

/// Every `qualifier.column` or bare `column` reference in the projection
/// and `WHERE` clause. Bare (unqualified) references come back with a
/// `None` qualifier and are skipped by the caller — they need alias
/// resolution this function can't do on its own.
fn collect_qualified_columns(statement: &Statement) -> Vec<(Option<String>, String)> {
    let mut refs = Vec::new();
    if let Statement::Query(query) = statement {
        if let SetExpr::Select(select) = query.body.as_ref() {
            collect_from_select(select, &mut refs);
        }
    }
    refs
}

fn collect_from_select(select: &Select, refs: &mut Vec<(Option<String>, String)>) {
    use sqlparser::ast::SelectItem;
    for item in &select.projection {
        match item {
            SelectItem::UnnamedExpr(e) | SelectItem::ExprWithAlias { expr: e, .. } => {
                walk_expr(e, refs);
            }
            _ => {}
        }
    }
    if let Some(selection) = &select.selection {
        walk_expr(selection, refs);
    }
}

fn walk_expr(expr: &Expr, refs: &mut Vec<(Option<String>, String)>) {
    match expr {
        Expr::CompoundIdentifier(idents) if idents.len() >= 2 => {
            let qualifier = idents[idents.len() - 2].value.clone();
            let column = idents[idents.len() - 1].value.clone();
            refs.push((Some(qualifier), column));
        }
        Expr::Identifier(ident) => {
            refs.push((None, ident.value.clone()));
        }
        Expr::BinaryOp { left, right, .. } => {
            walk_expr(left, refs);
            walk_expr(right, refs);
        }
        Expr::UnaryOp { expr, .. } | Expr::IsNull(expr) | Expr::IsNotNull(expr) | Expr::Nested(expr) => {
            walk_expr(expr, refs);
        }
        Expr::Between {
            expr, low, high, ..
        } => {
            walk_expr(expr, refs);
            walk_expr(low, refs);
            walk_expr(high, refs);
        }
        Expr::InList { expr, list, .. } => {
            walk_expr(expr, refs);
            for item in list {
                walk_expr(item, refs);
            }
        }
        Expr::Function(func) => {
            if let FunctionArguments::List(list) = &func.args {
                for arg in &list.args {
                    if let sqlparser::ast::FunctionArg::Unnamed(FunctionArgExpr::Expr(inner)) = arg {
                        walk_expr(inner, refs);
                    }
                }
            }
        }
        _ => {}
    }
}
