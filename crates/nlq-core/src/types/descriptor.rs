//! Catalog descriptor types: the read-mostly shape a catalog store hands back.

use serde::{Deserialize, Serialize};

/// A grouping of related tables, used by the module router to scope retrieval
/// before column-level search (spec §4.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub name: String,
    pub description: String,
    pub table_names: Vec<String>,
    /// Configured keyword set the router's whole-word pass matches against.
    pub keywords: Vec<String>,
    /// Average of the embeddings of every table in `table_names`, computed
    /// at catalog rebuild time.
    pub embedding: Vec<f32>,
}

/// A single table in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    pub module: Option<String>,
    pub summary: String,
    pub columns: Vec<ColumnDescriptor>,
    pub row_count_estimate: Option<i64>,
}

impl TableDescriptor {
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// A single column within a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub is_primary_key: bool,
    /// Present when this column is a foreign key reference.
    pub references: Option<ForeignKeyRef>,
    pub description: Option<String>,
}

/// The target side of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub table: String,
    pub column: String,
}

/// A directed foreign-key edge between two tables, as modeled by the join
/// planner's per-query multigraph (spec §4.5). Distinct edges between the
/// same table pair are preserved (composite or multiple FKs), so ordering is
/// stabilized by `constraint_name` rather than discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FkEdge {
    pub constraint_name: String,
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
}

impl FkEdge {
    /// Stable sort key: `(from_table, to_table, constraint_name)`.
    pub fn sort_key(&self) -> (&str, &str, &str) {
        (&self.from_table, &self.to_table, &self.constraint_name)
    }
}
