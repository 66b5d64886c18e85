//! Builds the schema contract: which tables/columns a question refers to,
//! and what parts of the question found no match anywhere in the context
//! packet (spec §4.4).

use crate::gloss::gloss_column;
use nlq_core::config::LinkerConfig;
use nlq_core::types::{LinkedColumn, SchemaContextPacket, SchemaLinkBundle, TableWarning, ValueHint};
use std::collections::{HashMap, HashSet};

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "of", "for", "in", "on", "by", "to", "and", "or", "is", "are", "what",
    "how", "many", "much", "show", "me", "list", "find", "all", "with", "that", "this",
];

/// Columns this many or more link to a table earns it full credit in the
/// blended relevance score's count component; more than this stops mattering.
const COUNT_COMPONENT_SATURATION: usize = 3;

/// Unigram and bigram phrases from `question`, lowercased, stopwords dropped.
fn extract_key_phrases(question: &str) -> Vec<String> {
    let words: Vec<String> = question
        .split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .filter(|w| !w.is_empty() && !STOPWORDS.contains(&w.as_str()))
        .collect();

    let mut phrases = words.clone();
    for window in words.windows(2) {
        phrases.push(format!("{} {}", window[0], window[1]));
    }
    phrases
}

/// Builds the schema contract for `question` against `context`.
pub fn link_schema(question: &str, context: &SchemaContextPacket, config: &LinkerConfig) -> SchemaLinkBundle {
    let phrases = extract_key_phrases(question);

    let mut linked_columns: Vec<LinkedColumn> = Vec::new();
    let mut matched_phrases: HashSet<String> = HashSet::new();

    for table in &context.tables {
        for column in &table.descriptor.columns {
            let gloss = gloss_column(&table.descriptor.name, column);
            for phrase in &phrases {
                let confidence = phrase_match_confidence(phrase, &gloss.name_tokens, &gloss.synonyms, &table.descriptor.name);
                if let Some(confidence) = confidence {
                    linked_columns.push(LinkedColumn {
                        table: table.descriptor.name.clone(),
                        column: column.name.clone(),
                        matched_phrase: phrase.clone(),
                        type_hint: gloss.type_hint,
                        confidence,
                    });
                    matched_phrases.insert(phrase.clone());
                }
            }
        }
    }

    let required_tables = derive_required_tables(context, &linked_columns, config.table_relevance_threshold);
    let table_warnings = build_table_warnings(question, &required_tables, &config.table_warning_rules);

    let unsupported_concepts: Vec<String> = phrases
        .into_iter()
        .filter(|p| !matched_phrases.contains(p) && p.split(' ').count() == 1)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    SchemaLinkBundle {
        required_tables,
        linked_columns,
        value_hints: extract_value_hints(question, context),
        table_warnings,
        unsupported_concepts,
    }
}

fn phrase_match_confidence(phrase: &str, tokens: &[String], synonyms: &[String], table_name: &str) -> Option<f32> {
    let phrase_tokens: Vec<&str> = phrase.split(' ').collect();
    if tokens.iter().any(|t| t == phrase) {
        return Some(1.0);
    }
    if phrase_tokens.len() > 1 && phrase_tokens.iter().all(|pt| tokens.iter().any(|t| t == pt)) {
        return Some(0.9);
    }
    if synonyms.iter().any(|s| s.eq_ignore_ascii_case(phrase)) {
        return Some(0.75);
    }
    if phrase.eq_ignore_ascii_case(table_name) {
        return Some(0.6);
    }
    None
}

/// Blended relevance score per table (spec §4.4): 0.3 link-count + 0.4 best
/// link confidence + 0.3 retrieval similarity, compared against
/// `threshold`. Every table in the context packet is scored, not just ones
/// with a linked column, so a table retrieval ranked highly but the linker
/// never matched a phrase in can still qualify on similarity alone.
fn derive_required_tables(context: &SchemaContextPacket, linked_columns: &[LinkedColumn], threshold: f32) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut best_confidence: HashMap<&str, f32> = HashMap::new();
    for link in linked_columns {
        *counts.entry(link.table.as_str()).or_insert(0) += 1;
        let best = best_confidence.entry(link.table.as_str()).or_insert(0.0);
        if link.confidence > *best {
            *best = link.confidence;
        }
    }

    let mut required: Vec<String> = context
        .tables
        .iter()
        .filter_map(|table| {
            let name = table.descriptor.name.as_str();
            let count_component = (*counts.get(name).unwrap_or(&0)).min(COUNT_COMPONENT_SATURATION) as f32
                / COUNT_COMPONENT_SATURATION as f32;
            let best_score = *best_confidence.get(name).unwrap_or(&0.0);
            let retrieval_similarity = table.retrieval_score.unwrap_or(0.0);
            let blended = 0.3 * count_component + 0.4 * best_score + 0.3 * retrieval_similarity;
            (blended >= threshold).then(|| table.descriptor.name.clone())
        })
        .collect();
    required.sort();
    required.dedup();
    required
}

/// Static table-warning map (spec §3/§4.4): for each configured rule, warn
/// if its table ended up required and the question contains any of its
/// trigger keywords as a whole word.
fn build_table_warnings(question: &str, required_tables: &[String], rules: &[nlq_core::config::TableWarningRule]) -> Vec<TableWarning> {
    let question_tokens: HashSet<String> = question
        .split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .filter(|w| !w.is_empty())
        .collect();

    let mut warnings = Vec::new();
    for rule in rules {
        if !required_tables.iter().any(|t| t.eq_ignore_ascii_case(&rule.table)) {
            continue;
        }
        for keyword in &rule.trigger_keywords {
            if question_tokens.contains(&keyword.to_lowercase()) {
                warnings.push(TableWarning {
                    table: rule.table.clone(),
                    trigger_keyword: keyword.clone(),
                    message: rule.message.clone(),
                });
                break;
            }
        }
    }
    warnings
}

/// Extracts value hints: quoted literals paired with name/label, code, or
/// status-enum columns (spec §3/§4.4), plus bare ISO dates paired with
/// date-typed columns.
fn extract_value_hints(question: &str, context: &SchemaContextPacket) -> Vec<ValueHint> {
    use nlq_core::types::TypeHint;
    let mut hints = Vec::new();
    let quoted_literals = find_quoted_literals(question);

    for table in &context.tables {
        for column in &table.descriptor.columns {
            let gloss = gloss_column(&table.descriptor.name, column);
            match gloss.type_hint {
                TypeHint::Label | TypeHint::Code | TypeHint::StatusEnum => {
                    for literal in &quoted_literals {
                        hints.push(ValueHint {
                            table: table.descriptor.name.clone(),
                            column: column.name.clone(),
                            raw_text: literal.clone(),
                            normalized_value: literal.clone(),
                        });
                    }
                }
                TypeHint::Date => {
                    if let Some(date) = find_iso_date(question) {
                        hints.push(ValueHint {
                            table: table.descriptor.name.clone(),
                            column: column.name.clone(),
                            raw_text: date.clone(),
                            normalized_value: date,
                        });
                    }
                }
                _ => {}
            }
        }
    }
    hints
}

/// Every substring quoted with `'...'` or `"..."` in `question`, the quotes
/// stripped.
fn find_quoted_literals(question: &str) -> Vec<String> {
    let mut literals = Vec::new();
    for quote in ['\'', '"'] {
        let mut rest = question;
        while let Some(start) = rest.find(quote) {
            let after_start = &rest[start + quote.len_utf8()..];
            if let Some(end) = after_start.find(quote) {
                let literal = &after_start[..end];
                if !literal.is_empty() {
                    literals.push(literal.to_string());
                }
                rest = &after_start[end + quote.len_utf8()..];
            } else {
                break;
            }
        }
    }
    literals
}

fn find_iso_date(question: &str) -> Option<String> {
    let bytes: Vec<char> = question.chars().collect();
    for start in 0..bytes.len() {
        if start + 10 <= bytes.len() {
            let candidate: String = bytes[start..start + 10].iter().collect();
            if is_iso_date(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

fn is_iso_date(candidate: &str) -> bool {
    let chars: Vec<char> = candidate.chars().collect();
    chars.len() == 10
        && chars[0..4].iter().all(|c| c.is_ascii_digit())
        && chars[4] == '-'
        && chars[5..7].iter().all(|c| c.is_ascii_digit())
        && chars[7] == '-'
        && chars[8..10].iter().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlq_core::config::TableWarningRule;
    use nlq_core::types::{ColumnDescriptor, ContextTable, TableDescriptor, TableSource};

    fn packet() -> SchemaContextPacket {
        SchemaContextPacket {
            modules_considered: vec!["sales".to_string()],
            tables: vec![
                ContextTable {
                    descriptor: TableDescriptor {
                        name: "orders".to_string(),
                        module: Some("sales".to_string()),
                        summary: "orders".to_string(),
                        columns: vec![
                            ColumnDescriptor {
                                name: "id".to_string(),
                                data_type: "integer".to_string(),
                                nullable: false,
                                is_primary_key: true,
                                references: None,
                                description: None,
                            },
                            ColumnDescriptor {
                                name: "order_date".to_string(),
                                data_type: "date".to_string(),
                                nullable: false,
                                is_primary_key: false,
                                references: None,
                                description: None,
                            },
                            ColumnDescriptor {
                                name: "status".to_string(),
                                data_type: "text".to_string(),
                                nullable: false,
                                is_primary_key: false,
                                references: None,
                                description: None,
                            },
                        ],
                        row_count_estimate: Some(10),
                    },
                    source: TableSource::Retrieval,
                    retrieval_score: Some(0.9),
                },
                ContextTable {
                    descriptor: TableDescriptor {
                        name: "customers".to_string(),
                        module: Some("sales".to_string()),
                        summary: "customers".to_string(),
                        columns: vec![ColumnDescriptor {
                            name: "name".to_string(),
                            data_type: "text".to_string(),
                            nullable: false,
                            is_primary_key: false,
                            references: None,
                            description: None,
                        }],
                        row_count_estimate: Some(5),
                    },
                    source: TableSource::Retrieval,
                    retrieval_score: Some(0.3),
                },
            ],
            fk_edges: vec![],
        }
    }

    fn config() -> LinkerConfig {
        LinkerConfig::default()
    }

    #[test]
    fn links_direct_column_name_mention() {
        let bundle = link_schema("what is the order date", &packet(), &config());
        assert!(bundle.linked_columns.iter().any(|c| c.column == "order_date"));
    }

    #[test]
    fn flags_unsupported_concept() {
        let bundle = link_schema("show me the flux capacitor readings", &packet(), &config());
        assert!(bundle.unsupported_concepts.iter().any(|c| c == "flux" || c == "capacitor"));
    }

    #[test]
    fn required_tables_derived_from_blended_score() {
        let bundle = link_schema("what is the order date", &packet(), &config());
        assert!(bundle.required_tables.contains(&"orders".to_string()));
        assert!(!bundle.required_tables.contains(&"customers".to_string()));
    }

    #[test]
    fn low_threshold_admits_retrieval_only_table() {
        let mut cfg = config();
        cfg.table_relevance_threshold = 0.05;
        let bundle = link_schema("what is the order date", &packet(), &cfg);
        assert!(bundle.required_tables.contains(&"customers".to_string()));
    }

    #[test]
    fn extracts_date_value_hint() {
        let bundle = link_schema("orders placed on 2024-01-15", &packet(), &config());
        assert!(bundle.value_hints.iter().any(|h| h.normalized_value == "2024-01-15"));
    }

    #[test]
    fn extracts_quoted_literal_value_hint_for_status_column() {
        let bundle = link_schema("orders with status 'shipped'", &packet(), &config());
        assert!(bundle
            .value_hints
            .iter()
            .any(|h| h.column == "status" && h.normalized_value == "shipped"));
    }

    #[test]
    fn static_warning_fires_on_trigger_keyword() {
        let mut cfg = config();
        cfg.table_relevance_threshold = 0.05;
        cfg.table_warning_rules = vec![TableWarningRule {
            table: "orders".to_string(),
            trigger_keywords: vec!["status".to_string()],
            message: "status here means order status, not shipment status".to_string(),
        }];
        let bundle = link_schema("what is the order status", &packet(), &cfg);
        assert!(bundle.table_warnings.iter().any(|w| w.table == "orders" && w.trigger_keyword == "status"));
    }

    #[test]
    fn static_warning_does_not_fire_without_trigger_keyword() {
        let mut cfg = config();
        cfg.table_warning_rules = vec![TableWarningRule {
            table: "orders".to_string(),
            trigger_keywords: vec!["status".to_string()],
            message: "irrelevant".to_string(),
        }];
        let bundle = link_schema("what is the order date", &packet(), &cfg);
        assert!(bundle.table_warnings.is_empty());
    }
}
