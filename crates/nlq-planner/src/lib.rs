pub mod error;
pub mod graph;
pub mod kshortest;
pub mod planner;

pub use error::{PlannerError, PlannerResult};
pub use graph::{JoinEdge, JoinGraph};
pub use kshortest::{k_shortest_paths, WeightedPath};
pub use planner::plan_join;
