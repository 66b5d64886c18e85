//! Turns a set of required tables plus the catalog's foreign-key edges into
//! one or more candidate join skeletons (spec §4.5).

use crate::error::{PlannerError, PlannerResult};
use crate::graph::JoinGraph;
use crate::kshortest::{k_shortest_paths, WeightedPath};
use nlq_core::config::PlannerConfig;
use nlq_core::types::{FkEdge, JoinClause, JoinPlan, JoinSkeleton};
use petgraph::graph::NodeIndex;

fn path_to_skeleton(graph: &JoinGraph, path: &WeightedPath) -> JoinSkeleton {
    let tables_in_order = path
        .nodes
        .iter()
        .map(|idx| graph.graph[*idx].clone())
        .collect::<Vec<_>>();

    let clauses = path
        .edges
        .iter()
        .map(|edge_idx| {
            let join_edge = &graph.graph[*edge_idx];
            let (left, right): (&FkEdge, bool) = (&join_edge.fk, join_edge.is_child_to_parent);
            if right {
                JoinClause {
                    left_table: left.from_table.clone(),
                    left_column: left.from_column.clone(),
                    right_table: left.to_table.clone(),
                    right_column: left.to_column.clone(),
                    constraint_name: left.constraint_name.clone(),
                }
            } else {
                JoinClause {
                    left_table: left.to_table.clone(),
                    left_column: left.to_column.clone(),
                    right_table: left.from_table.clone(),
                    right_column: left.from_column.clone(),
                    constraint_name: left.constraint_name.clone(),
                }
            }
        })
        .collect();

    JoinSkeleton {
        tables_in_order,
        clauses,
        cost: path.cost,
    }
}

/// Greedily grows a connected tree over `required` starting from its
/// (deterministically) first table, each step adding the cheapest path from
/// the current tree to an unconnected required table. This is the "minimum
/// connecting subgraph approximation" the planner uses for more than two
/// required tables, where exact Steiner-tree computation is not worth the
/// complexity for schemas this size.
fn greedy_connect(graph: &JoinGraph, required: &[String]) -> PlannerResult<JoinSkeleton> {
    let mut sorted_required = required.to_vec();
    sorted_required.sort();
    sorted_required.dedup();

    let mut connected_tables = vec![sorted_required[0].clone()];
    let mut remaining: Vec<String> = sorted_required[1..].to_vec();
    let mut all_clauses: Vec<JoinClause> = Vec::new();
    let mut total_cost = 0.0;
    let mut tables_in_order = vec![sorted_required[0].clone()];

    while !remaining.is_empty() {
        let mut best: Option<(usize, WeightedPath)> = None;
        for (i, candidate) in remaining.iter().enumerate() {
            let target = graph
                .node_for(candidate)
                .ok_or_else(|| PlannerError::UnknownTable(candidate.clone()))?;
            for source_table in &connected_tables {
                let source = graph
                    .node_for(source_table)
                    .ok_or_else(|| PlannerError::UnknownTable(source_table.clone()))?;
                if let Some(path) = k_shortest_paths(&graph.graph, source, target, 1).into_iter().next() {
                    let is_better = match &best {
                        Some((_, b)) => path.cost < b.cost,
                        None => true,
                    };
                    if is_better {
                        best = Some((i, path));
                    }
                }
            }
        }

        let Some((idx, path)) = best else {
            return Err(PlannerError::NoConnectingPath {
                from: connected_tables.join(","),
                to: remaining.join(","),
            });
        };

        let skeleton = path_to_skeleton(graph, &path);
        for table in &skeleton.tables_in_order {
            if !connected_tables.contains(table) {
                connected_tables.push(table.clone());
            }
            if !tables_in_order.contains(table) {
                tables_in_order.push(table.clone());
            }
        }
        all_clauses.extend(skeleton.clauses);
        total_cost += skeleton.cost;
        remaining.remove(idx);
    }

    Ok(JoinSkeleton {
        tables_in_order,
        clauses: all_clauses,
        cost: total_cost,
    })
}

/// Builds the join plan connecting every table in `required_tables`,
/// producing a best skeleton plus up to `config.max_skeletons - 1`
/// alternatives for the reranker's join-skeleton-match signal.
pub fn plan_join(required_tables: &[String], fk_edges: &[FkEdge], config: &PlannerConfig) -> PlannerResult<JoinPlan> {
    if required_tables.is_empty() {
        return Err(PlannerError::UnknownTable("<none>".to_string()));
    }
    if required_tables.len() == 1 {
        let only = required_tables[0].clone();
        let skeleton = JoinSkeleton {
            tables_in_order: vec![only],
            clauses: Vec::new(),
            cost: 0.0,
        };
        return Ok(JoinPlan {
            best: skeleton,
            alternatives: Vec::new(),
        });
    }

    let graph = JoinGraph::build(fk_edges, required_tables, config.hub_traversal_penalty, config.child_parent_bonus);

    if required_tables.len() == 2 {
        let source = node_or_err(&graph, &required_tables[0])?;
        let target = node_or_err(&graph, &required_tables[1])?;
        let paths = k_shortest_paths(&graph.graph, source, target, config.k_shortest_paths.max(1));
        if paths.is_empty() {
            return Err(PlannerError::NoConnectingPath {
                from: required_tables[0].clone(),
                to: required_tables[1].clone(),
            });
        }
        let mut skeletons: Vec<JoinSkeleton> = paths.iter().map(|p| path_to_skeleton(&graph, p)).collect();
        let best = skeletons.remove(0);
        skeletons.truncate(config.max_skeletons.saturating_sub(1));
        return Ok(JoinPlan {
            best,
            alternatives: skeletons,
        });
    }

    let best = greedy_connect(&graph, required_tables)?;
    // Alternatives: re-run starting from each other required table, keeping
    // only skeletons with a distinct clause set from what's already kept.
    let mut alternatives = Vec::new();
    let mut rotated = required_tables.to_vec();
    for _ in 1..required_tables.len() {
        rotated.rotate_left(1);
        if let Ok(candidate) = greedy_connect(&graph, &rotated) {
            let signature = |s: &JoinSkeleton| {
                let mut names: Vec<String> = s.clauses.iter().map(|c| c.constraint_name.clone()).collect();
                names.sort();
                names
            };
            if signature(&candidate) != signature(&best) && !alternatives.iter().any(|a| signature(a) == signature(&candidate)) {
                alternatives.push(candidate);
            }
        }
        if alternatives.len() + 1 >= config.max_skeletons {
            break;
        }
    }

    Ok(JoinPlan { best, alternatives })
}

fn node_or_err(graph: &JoinGraph, table: &str) -> PlannerResult<NodeIndex> {
    graph.node_for(table).ok_or_else(|| PlannerError::UnknownTable(table.to_string()))
}
