//! Deterministic column glosses: name tokenization, suffix-rule type
//! inference, and a small synonym dictionary. Grounded in the teacher's
//! `analyze_column_name` suffix rules, generalized from "which test applies"
//! to "what does this column mean".

use nlq_core::types::{ColumnDescriptor, ColumnGloss, TypeHint};
use std::collections::HashMap;

/// Splits `snake_case` and `camelCase` identifiers into lowercase word
/// tokens: `created_at` -> ["created", "at"], `customerId` -> ["customer", "id"].
pub fn tokenize_identifier(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch == '_' || ch == '-' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        }
        current.push(ch.to_ascii_lowercase());
        prev_lower = ch.is_lowercase();
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Suffix-rule type inference, mirroring the teacher's column-name analyzer:
/// `_id`/`id`/`pk` -> identifier, `_at`/`_date`/`_time`/created/updated/deleted
/// -> date-ish, amount/price/cost/total/revenue/balance/`_usd`/`_cents` ->
/// monetary, `_pct`/percentage -> percentage, `is_`/`has_`/`_flag` -> flag,
/// `count`/`num_`/`_qty` -> count.
pub fn infer_type_hint(column: &ColumnDescriptor) -> TypeHint {
    let name_lower = column.name.to_lowercase();
    let tokens = tokenize_identifier(&column.name);

    if column.is_primary_key || column.references.is_some() {
        return TypeHint::Identifier;
    }
    if name_lower.ends_with("_id") || name_lower == "id" || name_lower.ends_with("pk") {
        return TypeHint::Identifier;
    }
    if name_lower.ends_with("_at") || name_lower.contains("timestamp") {
        return TypeHint::Timestamp;
    }
    if name_lower.ends_with("_date") || tokens.iter().any(|t| ["created", "updated", "deleted"].contains(&t.as_str())) {
        return TypeHint::Date;
    }
    const MONETARY: &[&str] = &["amount", "price", "cost", "total", "revenue", "balance"];
    if tokens.iter().any(|t| MONETARY.contains(&t.as_str())) || name_lower.ends_with("_usd") || name_lower.ends_with("_cents") {
        return TypeHint::Monetary;
    }
    if name_lower.ends_with("_pct") || tokens.iter().any(|t| t == "percentage" || t == "percent") {
        return TypeHint::Percentage;
    }
    if name_lower.starts_with("is_") || name_lower.starts_with("has_") || name_lower.ends_with("_flag") {
        return TypeHint::Flag;
    }
    if tokens.iter().any(|t| t == "count" || t == "qty" || t == "quantity") || name_lower.starts_with("num_") {
        return TypeHint::Count;
    }
    if name_lower.ends_with("_status") || name_lower.ends_with("_state") || tokens.iter().any(|t| t == "status" || t == "state") {
        return TypeHint::StatusEnum;
    }
    if name_lower.ends_with("_code") || tokens.iter().any(|t| t == "code") {
        return TypeHint::Code;
    }
    if name_lower.ends_with("_name") || name_lower.ends_with("_label") || tokens.iter().any(|t| t == "name" || t == "label") {
        return TypeHint::Label;
    }
    if column.data_type.to_lowercase().contains("text") || column.data_type.to_lowercase().contains("varchar") {
        return TypeHint::FreeText;
    }
    TypeHint::Unknown
}

fn abbreviation_dictionary() -> HashMap<&'static str, &'static [&'static str]> {
    HashMap::from([
        ("id", ["identifier"].as_slice()),
        ("qty", ["quantity"].as_slice()),
        ("amt", ["amount"].as_slice()),
        ("cust", ["customer"].as_slice()),
        ("desc", ["description"].as_slice()),
        ("num", ["number"].as_slice()),
        ("addr", ["address"].as_slice()),
        ("dob", ["date of birth", "birthdate"].as_slice()),
        ("qtr", ["quarter"].as_slice()),
        ("ytd", ["year to date"].as_slice()),
    ])
}

/// Builds the gloss for one column: tokens, inferred type hint, and any
/// synonyms its tokens expand to via the abbreviation dictionary.
pub fn gloss_column(table: &str, column: &ColumnDescriptor) -> ColumnGloss {
    let tokens = tokenize_identifier(&column.name);
    let dictionary = abbreviation_dictionary();
    let mut synonyms = Vec::new();
    for token in &tokens {
        if let Some(expansions) = dictionary.get(token.as_str()) {
            for expansion in *expansions {
                synonyms.push(expansion.to_string());
            }
        }
    }
    ColumnGloss {
        table: table.to_string(),
        column: column.name.clone(),
        name_tokens: tokens,
        type_hint: infer_type_hint(column),
        synonyms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            data_type: "text".to_string(),
            nullable: true,
            is_primary_key: false,
            references: None,
            description: None,
        }
    }

    #[test]
    fn tokenizes_snake_case() {
        assert_eq!(tokenize_identifier("created_at"), vec!["created", "at"]);
    }

    #[test]
    fn tokenizes_camel_case() {
        assert_eq!(tokenize_identifier("customerId"), vec!["customer", "id"]);
    }

    #[test]
    fn infers_identifier_suffix() {
        assert_eq!(infer_type_hint(&column("customer_id")), TypeHint::Identifier);
    }

    #[test]
    fn infers_monetary_suffix() {
        assert_eq!(infer_type_hint(&column("total_amount")), TypeHint::Monetary);
    }

    #[test]
    fn infers_date_suffix() {
        assert_eq!(infer_type_hint(&column("order_date")), TypeHint::Date);
    }

    #[test]
    fn infers_flag_prefix() {
        assert_eq!(infer_type_hint(&column("is_active")), TypeHint::Flag);
    }

    #[test]
    fn expands_known_abbreviation() {
        let gloss = gloss_column("orders", &column("cust_id"));
        assert!(gloss.synonyms.contains(&"customer".to_string()));
    }

    #[test]
    fn infers_status_enum_suffix() {
        assert_eq!(infer_type_hint(&column("order_status")), TypeHint::StatusEnum);
    }

    #[test]
    fn infers_code_suffix() {
        assert_eq!(infer_type_hint(&column("currency_code")), TypeHint::Code);
    }

    #[test]
    fn infers_label_suffix() {
        assert_eq!(infer_type_hint(&column("customer_name")), TypeHint::Label);
    }
}
