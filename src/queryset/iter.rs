//! Lazy result iteration and the result cache
//!
//! The first iteration of a `QuerySet` plans and runs the query,
//! streaming rows while copying them into a build-up buffer. The buffer
//! becomes the cache only when the stream is exhausted. An iterator that
//! is dropped early, or that hits a folder failure, commits nothing.

use std::mem;
use std::sync::Arc;

use super::queryset::QuerySet;
use super::spec::QuerySpec;
use crate::executor::{QueryExecutor, ResultFormatter, Row};
use crate::folder::Folder;
use crate::observability::{log_event, log_event_with_fields, Event};
use crate::planner::QueryPlanner;
use crate::queryset::QueryResult;

/// Stream of formatted rows
pub type RowStream<'a> = Box<dyn Iterator<Item = QueryResult<Row>> + 'a>;

/// Plans and runs `spec` against `folder`.
///
/// Format checks happen before the folder is called.
pub(crate) fn row_stream<'a, F: Folder + ?Sized>(
    folder: &'a F,
    spec: &QuerySpec,
) -> QueryResult<RowStream<'a>> {
    if spec.restriction.is_never() {
        log_event(Event::QueryEmpty);
        return Ok(Box::new(std::iter::empty()));
    }

    let formatter = ResultFormatter::new(spec.return_format, spec.only_fields.clone())?;
    let plan = QueryPlanner::new(folder).plan(spec);
    log_event_with_fields(
        Event::QueryPlanned,
        &[
            ("access", plan.access.as_str()),
            ("client_sort", if plan.sorts_clientside() { "true" } else { "false" }),
            ("fields", &plan.additional_fields.len().to_string()),
            ("folder", folder.name()),
            ("restriction", &plan.restriction.to_string()),
        ],
    );

    let found = QueryExecutor::new(folder).execute(&plan)?;
    Ok(Box::new(
        found.map(move |r| r.map(|found| formatter.format(found))),
    ))
}

enum IterState<'q> {
    Cached {
        rows: Arc<Vec<Row>>,
        pos: usize,
    },
    Filling {
        source: RowStream<'q>,
        buildup: Vec<Row>,
        cache: &'q mut Option<Arc<Vec<Row>>>,
    },
    Done,
}

/// Iterator over a query's rows, filling the cache on exhaustion
pub struct QueryIter<'q> {
    state: IterState<'q>,
}

impl<'q> QueryIter<'q> {
    fn cached(rows: Arc<Vec<Row>>) -> Self {
        Self {
            state: IterState::Cached { rows, pos: 0 },
        }
    }

    /// Whether rows come from a filled cache
    pub fn is_cached(&self) -> bool {
        matches!(self.state, IterState::Cached { .. })
    }
}

impl Iterator for QueryIter<'_> {
    type Item = QueryResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.state {
            IterState::Cached { rows, pos } => {
                let row = rows.get(*pos).cloned();
                *pos += 1;
                row.map(Ok)
            }
            IterState::Filling {
                source, buildup, ..
            } => match source.next() {
                Some(Ok(row)) => {
                    buildup.push(row.clone());
                    Some(Ok(row))
                }
                Some(Err(err)) => {
                    self.state = IterState::Done;
                    Some(Err(err))
                }
                None => {
                    if let IterState::Filling { buildup, cache, .. } =
                        mem::replace(&mut self.state, IterState::Done)
                    {
                        log_event_with_fields(
                            Event::QueryCacheFilled,
                            &[("rows", &buildup.len().to_string())],
                        );
                        *cache = Some(Arc::new(buildup));
                    }
                    None
                }
            },
            IterState::Done => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.state {
            IterState::Cached { rows, pos } => {
                let left = rows.len().saturating_sub(*pos);
                (left, Some(left))
            }
            IterState::Filling { source, .. } => source.size_hint(),
            IterState::Done => (0, Some(0)),
        }
    }
}

impl<F: Folder + ?Sized> QuerySet<F> {
    /// Iterates the rows, committing them to the cache once the stream
    /// is exhausted. With a filled cache the folder is not called.
    pub fn iter(&mut self) -> QueryResult<QueryIter<'_>> {
        if let Some(rows) = &self.cache {
            log_event_with_fields(Event::QueryCacheHit, &[("rows", &rows.len().to_string())]);
            return Ok(QueryIter::cached(Arc::clone(rows)));
        }

        if self.spec.restriction.is_never() {
            log_event(Event::QueryEmpty);
            let rows = Arc::new(Vec::new());
            self.cache = Some(Arc::clone(&rows));
            return Ok(QueryIter::cached(rows));
        }

        let source = row_stream(&*self.folder, &self.spec)?;
        Ok(QueryIter {
            state: IterState::Filling {
                source,
                buildup: Vec::new(),
                cache: &mut self.cache,
            },
        })
    }

    /// Iterates the rows without filling the cache
    pub fn stream(&self) -> QueryResult<RowStream<'_>> {
        match &self.cache {
            Some(rows) => {
                let rows = Arc::clone(rows);
                Ok(Box::new((0..rows.len()).map(move |i| Ok(rows[i].clone()))))
            }
            None => row_stream(&*self.folder, &self.spec),
        }
    }

    /// Materializes every row, filling the cache
    pub fn to_vec(&mut self) -> QueryResult<Vec<Row>> {
        self.iter()?.collect()
    }

    /// Fills the cache if it is not filled yet
    pub fn fill(&mut self) -> QueryResult<()> {
        if self.cache.is_none() {
            for row in self.iter()? {
                row?;
            }
        }
        Ok(())
    }

    /// Rows of the filled cache
    pub(super) fn cached_rows(&mut self) -> QueryResult<Arc<Vec<Row>>> {
        self.fill()?;
        Ok(self.cache.clone().unwrap_or_default())
    }
}
