//! Delta prompt assembly (spec §4.9): the repair loop never rebuilds the
//! base prompt, it renders a short delta section describing what went
//! wrong and appends it. Compiled once with `minijinja`, the same way the
//! prompt-construction layer compiles its templates once and reuses them.

use crate::error::RepairResult;
use minijinja::{context, Environment};
use nlq_core::types::RepairHint;
use std::sync::OnceLock;

const DELTA_TEMPLATE_NAME: &str = "delta";
const DELTA_TEMPLATE: &str = "\
Attempt {{ attempt_number }} failed. Previous SQL:
{{ previous_sql }}

Fix the following and return corrected SQL only:
{% for hint in hints -%}
- {{ hint }}
{% endfor -%}
";

fn environment() -> &'static Environment<'static> {
    static ENV: OnceLock<Environment<'static>> = OnceLock::new();
    ENV.get_or_init(|| {
        let mut env = Environment::new();
        env.add_template(DELTA_TEMPLATE_NAME, DELTA_TEMPLATE)
            .expect("delta template must compile");
        env
    })
}

/// Renders one attempt's delta prompt, to be appended after the
/// (unchanged) base prompt.
pub fn render_delta_prompt(attempt_number: usize, previous_sql: &str, hints: &[RepairHint]) -> RepairResult<String> {
    let descriptions: Vec<String> = hints.iter().map(describe_hint).collect();
    let template = environment().get_template(DELTA_TEMPLATE_NAME)?;
    let rendered = template.render(context! {
        attempt_number => attempt_number,
        previous_sql => previous_sql,
        hints => descriptions,
    })?;
    Ok(rendered)
}

fn describe_hint(hint: &RepairHint) -> String {
    match hint {
        RepairHint::CrossTable {
            column,
            wrong_table,
            correct_table,
        } => format!("column '{column}' belongs to '{correct_table}', not '{wrong_table}'; qualify it with the right table or alias"),
        RepairHint::PhantomColumn { table, column } => {
            format!("table '{table}' has no column '{column}'; remove it or pick one of its real columns")
        }
        RepairHint::SurgicalWhitelist { original, candidates } => {
            format!("'{original}' doesn't match the schema; choose one of: {}", candidates.join(", "))
        }
    }
}
