//! Base prompt construction (spec §4.6): concatenates a fixed system
//! preamble, the compact table listing, the schema contract, the join
//! plan, and the question, in that order. Compiled once with `minijinja`
//! and reused across queries, matching the teacher's jinja-templating
//! layer rather than inline `format!` assembly.

use nlq_core::types::{JoinPlan, SchemaContextPacket, SchemaLinkBundle};
use minijinja::{context, Environment};
use std::collections::BTreeMap;
use std::sync::OnceLock;

const BASE_TEMPLATE_NAME: &str = "base_prompt";
const BASE_TEMPLATE: &str = "\
{{ system_preamble }}

## Schema
{% for line in table_lines %}{{ line }}
{% endfor %}
## Schema Contract
{% for line in contract_lines %}{{ line }}
{% endfor %}
## Join Plan
{% for line in join_lines %}{{ line }}
{% endfor %}
## Question
{{ question }}
";

fn environment() -> &'static Environment<'static> {
    static ENV: OnceLock<Environment<'static>> = OnceLock::new();
    ENV.get_or_init(|| {
        let mut env = Environment::new();
        env.add_template(BASE_TEMPLATE_NAME, BASE_TEMPLATE)
            .expect("base prompt template must compile");
        env
    })
}

const SYSTEM_PREAMBLE: &str = "\
You generate a single read-only SQL SELECT statement for PostgreSQL.
Only SELECT statements are allowed: no INSERT, UPDATE, DELETE, DDL, TRUNCATE, GRANT, COPY,
or session/admin/file/network functions. Reference only tables and columns listed below.
Return SQL only, no commentary.";

/// Builds the complete base prompt for candidate generation, in the fixed
/// order spec.md §4.6 describes. This is the prompt base every repair
/// attempt's delta section is appended to, unchanged.
pub fn build_base_prompt(
    question: &str,
    context: &SchemaContextPacket,
    link_bundle: &SchemaLinkBundle,
    join_plan: &JoinPlan,
) -> Result<String, minijinja::Error> {
    let template = environment().get_template(BASE_TEMPLATE_NAME)?;
    template.render(context! {
        system_preamble => SYSTEM_PREAMBLE,
        table_lines => table_lines(context),
        contract_lines => contract_lines(link_bundle),
        join_lines => join_lines(join_plan),
        question => question,
    })
}

/// Compact per-table listing, grouped by module in first-encounter order,
/// columns rendered with type hints (spec §4.6 "no per-column LLM-generated
/// text is injected").
fn table_lines(context: &SchemaContextPacket) -> Vec<String> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut module_order = Vec::new();

    for table in &context.tables {
        let module = table.descriptor.module.clone().unwrap_or_else(|| "ungrouped".to_string());
        if !grouped.contains_key(&module) {
            module_order.push(module.clone());
        }
        let columns: Vec<String> = table
            .descriptor
            .columns
            .iter()
            .map(|c| format!("{} ({})", c.name, type_hint_label(&c.name)))
            .collect();
        grouped.entry(module).or_default().push(format!(
            "  - {} ({}): {}",
            table.descriptor.name,
            table.descriptor.summary,
            columns.join(", ")
        ));
    }

    let mut lines = Vec::new();
    for module in module_order {
        lines.push(format!("### {module}"));
        if let Some(table_lines) = grouped.get(&module) {
            lines.extend(table_lines.iter().cloned());
        }
    }
    lines
}

/// Placeholder type-hint label for a bare column name, used only when no
/// linked gloss is available; `nlq-linker`'s `infer_type_hint` is the
/// authoritative source when a `ColumnGloss` is on hand.
fn type_hint_label(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    if lower.ends_with("_id") || lower == "id" {
        "identifier"
    } else if lower.ends_with("_at") {
        "timestamp"
    } else if lower.ends_with("_date") {
        "date"
    } else {
        "text"
    }
}

fn contract_lines(link_bundle: &SchemaLinkBundle) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(format!("Required tables: {}", link_bundle.required_tables.join(", ")));

    if link_bundle.linked_columns.is_empty() {
        lines.push("Allowed columns: all columns in the schema above are allowed.".to_string());
    } else {
        let columns: Vec<String> = link_bundle
            .linked_columns
            .iter()
            .map(|c| format!("{}.{} ({:?}, matched \"{}\")", c.table, c.column, c.type_hint, c.matched_phrase))
            .collect();
        lines.push(format!("Allowed columns: {}", columns.join("; ")));
    }

    for hint in &link_bundle.value_hints {
        lines.push(format!(
            "Value hint: {}.{} = {} (from \"{}\")",
            hint.table, hint.column, hint.normalized_value, hint.raw_text
        ));
    }

    for warning in &link_bundle.table_warnings {
        lines.push(format!("Warning: {}", warning.message));
    }

    for concept in &link_bundle.unsupported_concepts {
        lines.push(format!(
            "Unsupported concept: \"{concept}\" has no matching schema entity; do not invent a column for it."
        ));
    }

    lines
}

fn join_lines(join_plan: &JoinPlan) -> Vec<String> {
    if join_plan.best.clauses.is_empty() {
        return vec!["No join required.".to_string()];
    }
    join_plan
        .best
        .clauses
        .iter()
        .map(|c| {
            format!(
                "{}.{} = {}.{} (via {})",
                c.left_table, c.left_column, c.right_table, c.right_column, c.constraint_name
            )
        })
        .collect()
}
