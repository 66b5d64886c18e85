//! The schema context packet assembled by the retriever and consumed by the
//! linker, planner, and prompt construction (spec §4.3).

use crate::types::descriptor::{FkEdge, TableDescriptor};
use serde::{Deserialize, Serialize};

/// Why a table ended up in the context packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableSource {
    /// Selected directly by the fused cosine/BM25 retrieval ranking.
    Retrieval,
    /// Pulled in to connect two retrieved tables via a foreign key path.
    FkExpansion,
    /// Added by the optional pre-SQL recall pass (feature-flagged).
    PreSqlRecall,
}

/// One table as carried in the context packet, annotated with why it's there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextTable {
    pub descriptor: TableDescriptor,
    pub source: TableSource,
    /// Fused retrieval score, `None` for FK-expansion/pre-SQL-recall tables.
    pub retrieval_score: Option<f32>,
}

/// The full schema context handed to the linker and into prompt construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaContextPacket {
    pub modules_considered: Vec<String>,
    pub tables: Vec<ContextTable>,
    pub fk_edges: Vec<FkEdge>,
}

impl SchemaContextPacket {
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.descriptor.name.as_str()).collect()
    }

    pub fn table(&self, name: &str) -> Option<&ContextTable> {
        self.tables
            .iter()
            .find(|t| t.descriptor.name.eq_ignore_ascii_case(name))
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }
}
