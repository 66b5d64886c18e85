//! Deterministic column glosses produced by the linker (spec §4.4).

use serde::{Deserialize, Serialize};

/// A semantic type hint inferred from a column's name/type, independent of
/// its declared SQL type. Mirrors the suffix-rule inference the teacher's
/// test-suggestion analyzer performs over column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeHint {
    Identifier,
    Date,
    Timestamp,
    Monetary,
    Percentage,
    Count,
    Flag,
    /// A short coded value (`status_code`, `currency_code`), distinct from
    /// a free-text label.
    Code,
    /// An enum-like status/state column with a small fixed value set.
    StatusEnum,
    /// A human-readable name/label column, the usual target for a quoted
    /// literal in the question.
    Label,
    FreeText,
    Unknown,
}

/// A human-readable gloss for one column, built once per catalog rebuild and
/// reused across queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnGloss {
    pub table: String,
    pub column: String,
    /// Words split out of the column's identifier (`created_at` -> ["created", "at"]).
    pub name_tokens: Vec<String>,
    pub type_hint: TypeHint,
    /// Alternate phrasings a question might use to refer to this column.
    pub synonyms: Vec<String>,
}
