//! Multi-child activity planning: candidate pools, the branch-and-bound
//! solver, and infeasibility diagnosis.

pub mod conflicts;
pub mod diagnose;
pub mod pool;
pub mod solver;

pub use diagnose::diagnose;
pub use pool::{build_context, build_pool};
pub use solver::{solve, ChildContext, PlanRequest};
