//! Query executor
//!
//! Runs a plan against a folder and yields raw results.
//!
//! Execution flow:
//! 1. Empty plans yield nothing without calling the folder
//! 2. Search (identity pairs, or the projection directly)
//! 3. Find-then-fetch plans collect the identity pairs and fetch full items
//! 4. Client-side ordering collects every result, sorts, then clears
//!    sort-only fields
//!
//! Results are pulled lazily from the folder unless step 3 or 4 applies.

use super::sorter::ResultSorter;
use crate::folder::{Folder, FolderError};
use crate::item::{Found, ItemIdentity};
use crate::observability::{log_event_with_fields, Event};
use crate::planner::{AccessPath, QueryPlan};
use crate::queryset::{QueryError, QueryResult};

/// Stream of raw results
pub type FoundIter<'a> = Box<dyn Iterator<Item = QueryResult<Found>> + 'a>;

/// Executes plans against a folder
pub struct QueryExecutor<'a, F: Folder + ?Sized> {
    folder: &'a F,
}

impl<'a, F: Folder + ?Sized> QueryExecutor<'a, F> {
    pub fn new(folder: &'a F) -> Self {
        Self { folder }
    }

    /// Executes a plan. Folder failures surface as `QueryError::Folder`.
    pub fn execute(&self, plan: &QueryPlan) -> QueryResult<FoundIter<'a>> {
        let request = plan.find_request();

        let results: FoundIter<'a> = match plan.access {
            AccessPath::Empty => return Ok(Box::new(std::iter::empty())),
            AccessPath::Find => {
                let stream = self.folder.find_items(&plan.restriction, &request)?;
                Box::new(stream.map(|r| r.map_err(QueryError::from)))
            }
            AccessPath::FindThenFetch => {
                let ids = self
                    .folder
                    .find_items(&plan.restriction, &request)?
                    .map(|r| r.map_err(QueryError::from).and_then(Self::identity_of))
                    .collect::<QueryResult<Vec<ItemIdentity>>>()?;
                log_event_with_fields(
                    Event::QueryDirectFetch,
                    &[("ids", &ids.len().to_string())],
                );
                let stream = self.folder.fetch(ids, Some(plan.additional_fields.as_slice()))?;
                Box::new(stream.map(|r| r.map_err(QueryError::from)))
            }
        };

        let orders = match &plan.client_order {
            Some(orders) => orders,
            None => return Ok(results),
        };

        let mut collected = results.collect::<QueryResult<Vec<Found>>>()?;
        log_event_with_fields(
            Event::QueryClientSort,
            &[
                ("keys", &orders.len().to_string()),
                ("rows", &collected.len().to_string()),
            ],
        );
        ResultSorter::sort(&mut collected, orders);

        if plan.sort_only_fields.is_empty() {
            return Ok(Box::new(collected.into_iter().map(Ok)));
        }
        let strip = plan.sort_only_fields.clone();
        Ok(Box::new(
            collected
                .into_iter()
                .map(move |found| Ok(ResultSorter::strip(found, &strip))),
        ))
    }

    fn identity_of(found: Found) -> QueryResult<ItemIdentity> {
        found.identity().ok_or_else(|| {
            QueryError::from(FolderError::MalformedResponse(
                "search result without identity".into(),
            ))
        })
    }
}
