//! folder-queryset - Deferred, chainable, cached queries over remote item folders
//!
//! A `QuerySet` accumulates a restriction, a projection, an ordering and
//! paging hints. Nothing reaches the folder until the query is consumed.
//! The planner then decides what the store can do itself and what has to
//! be emulated locally (multi-key sorting, complex field retrieval,
//! negative indexing).

pub mod config;
pub mod executor;
pub mod fields;
pub mod folder;
pub mod item;
pub mod observability;
pub mod planner;
pub mod queryset;
pub mod restriction;

pub use config::QueryConfig;
pub use fields::{Field, FieldOrder, FieldPath};
pub use folder::{Folder, FolderError, MemoryFolder};
pub use item::{Found, Item, ItemIdentity};
pub use queryset::{Lookup, QueryError, QueryResult, QuerySet, ReturnFormat, Row, Slice};
pub use restriction::Restriction;
