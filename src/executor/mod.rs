//! Query executor subsystem
//!
//! Consumes plans and produces results in the requested shape.
//!
//! # Components
//!
//! - `QueryExecutor`: issues the folder calls a plan describes
//! - `ResultSorter`: stable multi-key client-side ordering
//! - `ResultFormatter`: items, value maps, value tuples or scalars

mod executor;
mod formatter;
mod result;
mod sorter;

pub use executor::{FoundIter, QueryExecutor};
pub use formatter::ResultFormatter;
pub use result::{ReturnFormat, Row};
pub use sorter::{compare_values, ResultSorter};
