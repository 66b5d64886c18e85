//! Join planner output types (spec §4.5).

use serde::{Deserialize, Serialize};

/// One edge traversal in a join skeleton, oriented the direction it was
/// walked (which may be the reverse of the underlying FK's declared direction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinClause {
    pub left_table: String,
    pub left_column: String,
    pub right_table: String,
    pub right_column: String,
    pub constraint_name: String,
}

/// A single candidate way of connecting the required tables, in traversal
/// order. The planner may produce several skeletons when more than one
/// minimal connecting path exists; each is scored and the caller picks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinSkeleton {
    pub tables_in_order: Vec<String>,
    pub clauses: Vec<JoinClause>,
    /// Lower is better; accumulates hub-traversal penalties and
    /// child-to-parent-direction bonuses (spec §4.5).
    pub cost: f64,
}

/// The full output of the join planner for one query: the chosen skeleton
/// plus any runner-up skeletons kept for the reranker's join-skeleton-match
/// signal (spec §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinPlan {
    pub best: JoinSkeleton,
    pub alternatives: Vec<JoinSkeleton>,
}

impl JoinPlan {
    pub fn all_skeletons(&self) -> impl Iterator<Item = &JoinSkeleton> {
        std::iter::once(&self.best).chain(self.alternatives.iter())
    }
}
