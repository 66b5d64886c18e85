//! Per-query foreign-key multigraph. Generalizes the teacher's
//! `ModelDag` (a single-edge dependency DAG over `petgraph::graph::DiGraph`)
//! into a directed multigraph where distinct constraints between the same
//! pair of tables are kept as separate edges, and each direction of travel
//! carries its own cost.

use nlq_core::types::FkEdge;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// A traversable edge: which constraint it came from, which direction it's
/// being walked in relative to the underlying FK, and its planning cost.
#[derive(Debug, Clone)]
pub struct JoinEdge {
    pub fk: FkEdge,
    /// True when walked child (the table holding the FK column) to parent
    /// (the table the FK references) — the direction the FK itself points.
    pub is_child_to_parent: bool,
    pub cost: f64,
}

/// Tables considered "hubs": highly connected enough that routing through
/// them should cost more, so the planner prefers a path through a more
/// specific table when one exists.
const HUB_DEGREE_THRESHOLD: usize = 6;

pub struct JoinGraph {
    pub graph: DiGraph<String, JoinEdge>,
    pub node_index: HashMap<String, NodeIndex>,
}

impl JoinGraph {
    /// Builds the graph from `fk_edges`, touching only tables reachable from
    /// them plus any isolated `extra_tables`. Edges are sorted by
    /// `(from_table, to_table, constraint_name)` before insertion so graph
    /// construction — and therefore every downstream traversal — is
    /// deterministic regardless of the catalog's row order.
    pub fn build(fk_edges: &[FkEdge], extra_tables: &[String], hub_penalty: f64, child_parent_bonus: f64) -> Self {
        let mut sorted_edges = fk_edges.to_vec();
        sorted_edges.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let mut degree: HashMap<String, usize> = HashMap::new();
        for edge in &sorted_edges {
            *degree.entry(edge.from_table.clone()).or_insert(0) += 1;
            *degree.entry(edge.to_table.clone()).or_insert(0) += 1;
        }

        let mut graph = DiGraph::new();
        let mut node_index: HashMap<String, NodeIndex> = HashMap::new();

        let mut table_names: Vec<String> = sorted_edges
            .iter()
            .flat_map(|e| [e.from_table.clone(), e.to_table.clone()])
            .chain(extra_tables.iter().cloned())
            .collect();
        table_names.sort();
        table_names.dedup();

        for name in &table_names {
            let idx = graph.add_node(name.clone());
            node_index.insert(name.clone(), idx);
        }

        for edge in &sorted_edges {
            let from_idx = node_index[&edge.from_table];
            let to_idx = node_index[&edge.to_table];
            let from_is_hub = degree.get(&edge.from_table).copied().unwrap_or(0) > HUB_DEGREE_THRESHOLD;
            let to_is_hub = degree.get(&edge.to_table).copied().unwrap_or(0) > HUB_DEGREE_THRESHOLD;
            let hub_cost = if from_is_hub || to_is_hub { hub_penalty } else { 0.0 };

            // child (from_table) -> parent (to_table): the FK's own direction.
            graph.add_edge(
                from_idx,
                to_idx,
                JoinEdge {
                    fk: edge.clone(),
                    is_child_to_parent: true,
                    cost: (1.0 + hub_cost + child_parent_bonus).max(0.01),
                },
            );
            // parent -> child: the reverse walk, no child->parent bonus.
            graph.add_edge(
                to_idx,
                from_idx,
                JoinEdge {
                    fk: edge.clone(),
                    is_child_to_parent: false,
                    cost: (1.0 + hub_cost).max(0.01),
                },
            );
        }

        Self { graph, node_index }
    }

    pub fn node_for(&self, table: &str) -> Option<NodeIndex> {
        self.node_index.get(table).copied()
    }
}
