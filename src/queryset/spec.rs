//! Query specification
//!
//! Plain data accumulated by the chaining operations. Every chaining
//! call clones it, so a derived query never shares restriction or
//! ordering state with the query it came from.

use crate::executor::{ResultFormatter, ReturnFormat};
use crate::fields::{FieldOrder, FieldPath};
use crate::folder::CalendarView;
use crate::queryset::QueryResult;
use crate::restriction::Restriction;

/// Everything a query needs to be planned
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    /// `Restriction::Never` means the query returns nothing
    pub restriction: Restriction,
    /// `None` means every field the folder supports
    pub only_fields: Option<Vec<FieldPath>>,
    pub order_fields: Option<Vec<FieldOrder>>,
    pub return_format: ReturnFormat,
    /// Special view marker; disables server-side ordering
    pub calendar_view: Option<CalendarView>,
    /// Hint: items per remote page
    pub page_size: Option<usize>,
    /// Hint: stop after this many items
    pub max_items: Option<usize>,
}

impl QuerySpec {
    /// Whether any ordering is set
    pub fn is_ordered(&self) -> bool {
        self.order_fields.as_ref().is_some_and(|o| !o.is_empty())
    }

    /// Checks the return format against the projection
    pub fn validate(&self) -> QueryResult<()> {
        ResultFormatter::new(self.return_format, self.only_fields.clone()).map(|_| ())
    }
}
