//! Field descriptors for folder queries
//!
//! A folder exposes a fixed table of fields. Queries refer to them by
//! path strings which are resolved against that table up front, so an
//! unknown name fails at the chaining call and never reaches the store.
//!
//! # Path syntax
//!
//! - `subject` names a top-level field
//! - `organizer__email` names a subfield of a complex field
//! - `-subject` (ordering only) sorts the field in reverse

mod field;
mod order;

pub use field::{Field, FieldPath, CHANGEKEY, ITEM_ID};
pub use order::FieldOrder;
