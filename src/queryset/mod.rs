//! QuerySet subsystem
//!
//! Deferred, chainable queries over the items of a folder.
//!
//! # Lifecycle
//!
//! 1. Build: chaining operations (`filter`, `only`, `order_by`, ...) each
//!    return a new `QuerySet` with a cloned `QuerySpec`. Nothing is sent
//!    to the folder, but field names are resolved immediately.
//! 2. Consume: iteration, indexing, slicing and the terminal operations
//!    plan the query and run it.
//! 3. Cache: a complete pass commits the rows to the receiver's cache.
//!    Later consumption is served from it. A partial pass commits
//!    nothing. `delete()` drops the cache.
//!
//! # Concurrency
//!
//! Consumption takes `&mut self`, so one instance cannot be filled from
//! two places at once. Chain a copy per consumer instead.

mod errors;
mod iter;
mod queryset;
mod slice;
mod spec;
mod terminal;

pub use errors::{QueryError, QueryResult};
pub use iter::{QueryIter, RowStream};
pub use queryset::QuerySet;
pub use slice::{Slice, SliceResult, Sliced};
pub use spec::QuerySpec;
pub use terminal::Lookup;

pub use crate::executor::{ReturnFormat, Row};
