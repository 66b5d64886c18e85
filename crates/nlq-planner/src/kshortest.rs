//! Yen-style k-shortest-path search, layered on `petgraph::algo::astar`
//! (equivalent to Dijkstra with a zero heuristic). Not a textbook Yen's
//! algorithm — it approximates the "next shortest distinct path" by
//! removing the costliest edge of each path found so far and re-solving,
//! rather than enumerating every spur node. That's enough fidelity for the
//! planner's purpose: a handful of genuinely different join skeletons to
//! hand the reranker, not an exhaustive path ranking.

use crate::graph::JoinEdge;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

#[derive(Debug, Clone)]
pub struct WeightedPath {
    pub nodes: Vec<NodeIndex>,
    pub edges: Vec<EdgeIndex>,
    pub cost: f64,
}

fn shortest_path(
    graph: &DiGraph<String, JoinEdge>,
    source: NodeIndex,
    target: NodeIndex,
) -> Option<WeightedPath> {
    let (cost, nodes) = petgraph::algo::astar(graph, source, |n| n == target, |e| e.weight().cost, |_| 0.0)?;

    let mut edges = Vec::with_capacity(nodes.len().saturating_sub(1));
    for window in nodes.windows(2) {
        let edge = graph
            .edges_connecting(window[0], window[1])
            .min_by(|a, b| a.weight().cost.partial_cmp(&b.weight().cost).unwrap())?;
        edges.push(edge.id());
    }

    Some(WeightedPath { nodes, edges, cost })
}

/// Finds up to `k` distinct paths from `source` to `target`, best first.
pub fn k_shortest_paths(
    graph: &DiGraph<String, JoinEdge>,
    source: NodeIndex,
    target: NodeIndex,
    k: usize,
) -> Vec<WeightedPath> {
    let mut working = graph.clone();
    let mut results = Vec::new();

    for _ in 0..k {
        let Some(path) = shortest_path(&working, source, target) else {
            break;
        };
        let costliest_edge = path
            .edges
            .iter()
            .max_by(|a, b| {
                working[**a].cost.partial_cmp(&working[**b].cost).unwrap()
            })
            .copied();
        results.push(path);

        if let Some(edge) = costliest_edge {
            working.remove_edge(edge);
        } else {
            break;
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::JoinGraph;
    use nlq_core::types::FkEdge;

    fn edge(name: &str, from: &str, to: &str) -> FkEdge {
        FkEdge {
            constraint_name: name.to_string(),
            from_table: from.to_string(),
            from_column: format!("{from}_id"),
            to_table: to.to_string(),
            to_column: "id".to_string(),
        }
    }

    #[test]
    fn finds_shortest_path_between_two_tables() {
        let edges = vec![edge("fk1", "orders", "customers")];
        let graph = JoinGraph::build(&edges, &[], 0.5, -0.1);
        let source = graph.node_for("orders").unwrap();
        let target = graph.node_for("customers").unwrap();
        let paths = k_shortest_paths(&graph.graph, source, target, 3);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].nodes.len(), 2);
    }

    #[test]
    fn finds_alternate_path_through_hub() {
        let edges = vec![
            edge("fk_direct", "orders", "regions"),
            edge("fk_a", "orders", "customers"),
            edge("fk_b", "customers", "regions"),
        ];
        let graph = JoinGraph::build(&edges, &[], 0.5, -0.1);
        let source = graph.node_for("orders").unwrap();
        let target = graph.node_for("regions").unwrap();
        let paths = k_shortest_paths(&graph.graph, source, target, 2);
        assert!(paths.len() >= 2);
    }
}
