//! Query planner subsystem
//!
//! Decides what the folder can do server-side (filtering, single-field
//! ordering, paging hints) and what has to be emulated after retrieval
//! (multi-field ordering, ordering inside calendar views, complex field
//! retrieval through a second fetch).

mod explain;
mod planner;

pub use explain::ExplainPlan;
pub use planner::{AccessPath, QueryPlan, QueryPlanner};
