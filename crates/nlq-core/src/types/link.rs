//! Output of the schema linker: the schema contract handed to prompt
//! construction (spec §4.4).

use crate::types::gloss::TypeHint;
use serde::{Deserialize, Serialize};

/// A column the linker judged relevant to the question, with its matched
/// phrase and confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedColumn {
    pub table: String,
    pub column: String,
    pub matched_phrase: String,
    pub type_hint: TypeHint,
    pub confidence: f32,
}

/// A concrete value (or value pattern) the linker extracted from the
/// question text and mapped onto a column, e.g. a literal date or enum-like
/// string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueHint {
    pub table: String,
    pub column: String,
    pub raw_text: String,
    pub normalized_value: String,
}

/// A warning the linker attaches because a `required_tables` table is
/// configured with a static trigger keyword the question actually used
/// (e.g. warn about `orders.status` meaning order status, not shipment
/// status, whenever the question says "status").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableWarning {
    pub table: String,
    pub trigger_keyword: String,
    pub message: String,
}

/// The complete schema contract: what the question asked for, and how it
/// was mapped onto catalog entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaLinkBundle {
    pub required_tables: Vec<String>,
    pub linked_columns: Vec<LinkedColumn>,
    pub value_hints: Vec<ValueHint>,
    pub table_warnings: Vec<TableWarning>,
    /// Phrases in the question that matched no catalog entity at all.
    pub unsupported_concepts: Vec<String>,
}

impl SchemaLinkBundle {
    pub fn is_fully_supported(&self) -> bool {
        self.unsupported_concepts.is_empty()
    }
}
