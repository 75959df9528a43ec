//! Folder collaborator interface
//!
//! A folder is the remote collection a query runs against. It knows its
//! field table and exposes the store operations the query layer needs:
//! search, fetch by identity and bulk delete. Transport, auth and
//! retries live behind this trait.
//!
//! `MemoryFolder` is an in-process implementation that honours the same
//! contract as a remote store, including its refusal to return complex
//! fields from a search.

mod errors;
mod filter;
mod memory;

pub use errors::{FolderError, FolderResult};
pub use filter::RestrictionFilter;
pub use memory::{FolderCall, MemoryFolder};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::{Field, FieldOrder, FieldPath};
use crate::item::{Found, ItemIdentity};
use crate::restriction::Restriction;

/// Stream of search or fetch results
pub type FoundStream<'a> = Box<dyn Iterator<Item = FolderResult<Found>> + 'a>;

/// Calendar range view. Server-side sorting is unavailable while set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarView {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CalendarView {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whether an instant falls inside the view, bounds inclusive
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Shape of one search call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindRequest {
    /// Fields to return. `None` returns identity pairs only.
    pub additional_fields: Option<Vec<FieldPath>>,
    /// Server-side ordering
    pub order_fields: Option<Vec<FieldOrder>>,
    pub calendar_view: Option<CalendarView>,
    /// Hint: items per remote page
    pub page_size: Option<usize>,
    /// Hint: stop after this many items
    pub max_items: Option<usize>,
}

/// Outcome of a bulk delete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSummary {
    /// Number of ids submitted
    pub requested: usize,
    /// Number of items removed
    pub deleted: usize,
    /// Per-item failures as (item id, reason)
    pub failures: Vec<(String, String)>,
}

impl DeleteSummary {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.deleted == self.requested
    }
}

/// A remote item collection
pub trait Folder {
    /// Display name
    fn name(&self) -> &str;

    /// Every field this folder supports
    fn allowed_fields(&self) -> Vec<Field>;

    /// Fields a search cannot return
    fn complex_fields(&self) -> Vec<Field> {
        self.allowed_fields()
            .into_iter()
            .filter(Field::is_complex)
            .collect()
    }

    /// Searches the folder
    fn find_items(
        &self,
        restriction: &Restriction,
        request: &FindRequest,
    ) -> FolderResult<FoundStream<'_>>;

    /// Fetches full items by identity, restricted to `fields` (all when `None`).
    /// Results come back in the order of `ids`.
    fn fetch(
        &self,
        ids: Vec<ItemIdentity>,
        fields: Option<&[FieldPath]>,
    ) -> FolderResult<FoundStream<'_>>;

    /// Deletes items through the owning account
    fn bulk_delete(&self, ids: Vec<ItemIdentity>) -> FolderResult<DeleteSummary>;
}
