//! Indexing and slicing
//!
//! Non-negative positions are served lazily from the stream, with paging
//! hints capped when the position lies within the first remote page.
//! Negative positions cannot be expressed to the store: a negative index
//! re-runs the query with the ordering reversed, a negative slice
//! materializes the whole result and slices the cache.

use super::iter::{row_stream, RowStream};
use super::queryset::QuerySet;
use super::spec::QuerySpec;
use crate::executor::Row;
use crate::folder::Folder;
use crate::planner::QueryPlanner;
use crate::queryset::{QueryError, QueryResult};

/// A `[start:stop:step]` slice. Negative bounds count from the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<isize>,
}

impl Slice {
    pub fn new(start: Option<isize>, stop: Option<isize>, step: Option<isize>) -> Self {
        Self { start, stop, step }
    }

    /// `[start:stop]`
    pub fn range(start: isize, stop: isize) -> Self {
        Self::new(Some(start), Some(stop), None)
    }

    /// `[start:]`
    pub fn starting(start: isize) -> Self {
        Self::new(Some(start), None, None)
    }

    /// `[:stop]`
    pub fn until(stop: isize) -> Self {
        Self::new(None, Some(stop), None)
    }

    /// Same slice with a step
    pub fn step_by(mut self, step: isize) -> Self {
        self.step = Some(step);
        self
    }

    /// Whether any part is negative
    pub fn is_negative(&self) -> bool {
        [self.start, self.stop, self.step]
            .iter()
            .flatten()
            .any(|v| *v < 0)
    }

    /// Resolves the slice against a sequence of `len` elements, returning
    /// the selected positions in order.
    pub fn positions(&self, len: usize) -> Vec<usize> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Vec::new();
        }
        let len = len as isize;
        let (lower, upper) = if step < 0 { (-1, len - 1) } else { (0, len) };

        let clamp = |bound: Option<isize>, default: isize| match bound {
            None => default,
            Some(b) if b < 0 => (b + len).max(lower),
            Some(b) => b.min(upper),
        };
        let start = clamp(self.start, if step < 0 { upper } else { lower });
        let stop = clamp(self.stop, if step < 0 { lower } else { upper });

        let mut positions = Vec::new();
        let mut i = start;
        while (step > 0 && i < stop) || (step < 0 && i > stop) {
            positions.push(i as usize);
            i += step;
        }
        positions
    }
}

/// Lazy non-negative slice over a row stream.
///
/// Errors from the source are yielded, never skipped. The source is not
/// pulled past `stop`.
pub struct Sliced<'a> {
    source: RowStream<'a>,
    pos: usize,
    start: usize,
    stop: Option<usize>,
    step: usize,
    done: bool,
}

impl<'a> Sliced<'a> {
    fn new(source: RowStream<'a>, start: usize, stop: Option<usize>, step: usize) -> Self {
        Self {
            source,
            pos: 0,
            start,
            stop,
            step,
            done: false,
        }
    }

    fn empty() -> Self {
        Self::new(Box::new(std::iter::empty()), 0, Some(0), 1)
    }

    fn selected(&self, pos: usize) -> bool {
        pos >= self.start && (pos - self.start) % self.step == 0
    }
}

impl Iterator for Sliced<'_> {
    type Item = QueryResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if self.stop.is_some_and(|stop| self.pos >= stop) {
                self.done = true;
                break;
            }
            let pos = self.pos;
            match self.source.next() {
                None => self.done = true,
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
                Some(Ok(row)) => {
                    self.pos += 1;
                    if self.selected(pos) {
                        return Some(Ok(row));
                    }
                }
            }
        }
        None
    }
}

/// Result of `QuerySet::slice`
pub enum SliceResult<'a> {
    /// Positions picked from the filled cache
    Materialized(std::vec::IntoIter<Row>),
    /// Lazy pass over the stream
    Lazy(Sliced<'a>),
}

impl Iterator for SliceResult<'_> {
    type Item = QueryResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            SliceResult::Materialized(rows) => rows.next().map(Ok),
            SliceResult::Lazy(sliced) => sliced.next(),
        }
    }
}

impl<F: Folder + ?Sized> QuerySet<F> {
    /// Row at `index`. Negative indexes count from the end and need an
    /// ordering.
    pub fn at(&mut self, index: isize) -> QueryResult<Row> {
        if let Some(rows) = &self.cache {
            let len = rows.len() as isize;
            let resolved = if index < 0 { index + len } else { index };
            if resolved < 0 || resolved >= len {
                return Err(QueryError::OutOfRange { index });
            }
            return Ok(rows[resolved as usize].clone());
        }

        if index < 0 {
            if !self.spec.is_ordered() {
                return Err(QueryError::invalid_operation(
                    "negative indexing requires an ordering",
                ));
            }
            return self
                .reverse()?
                .at(-(index + 1))
                .map_err(|err| match err {
                    QueryError::OutOfRange { .. } => QueryError::OutOfRange { index },
                    other => other,
                });
        }

        let wanted = index as usize;
        let spec = self.capped_spec(wanted + 1);
        for (pos, row) in row_stream(&*self.folder, &spec)?.enumerate() {
            let row = row?;
            if pos == wanted {
                return Ok(row);
            }
        }
        Err(QueryError::OutOfRange { index })
    }

    /// Rows selected by `slice`.
    ///
    /// A negative start, stop or step fills the cache first. Otherwise the
    /// rows are pulled lazily and the cache is left as it was.
    pub fn slice(&mut self, slice: Slice) -> QueryResult<SliceResult<'_>> {
        if slice.step == Some(0) {
            return Err(QueryError::invalid_operation("slice step cannot be zero"));
        }

        if slice.is_negative() || self.cache.is_some() {
            let rows = self.cached_rows()?;
            let picked = slice
                .positions(rows.len())
                .into_iter()
                .map(|i| rows[i].clone())
                .collect::<Vec<_>>();
            return Ok(SliceResult::Materialized(picked.into_iter()));
        }

        let start = slice.start.unwrap_or(0) as usize;
        let step = slice.step.unwrap_or(1) as usize;
        let stop = slice.stop.map(|s| s as usize);

        if stop == Some(0) || stop.is_some_and(|stop| stop <= start) {
            return Ok(SliceResult::Lazy(Sliced::empty()));
        }

        let spec = match stop {
            Some(stop) => self.capped_spec(stop),
            None => self.spec.clone(),
        };
        let source = row_stream(&*self.folder, &spec)?;
        Ok(SliceResult::Lazy(Sliced::new(source, start, stop, step)))
    }

    /// Copy of the spec whose paging hints stop at `limit` rows.
    ///
    /// Hints stay unset when `limit` is past the first remote page, or when
    /// rows are sorted locally: the store would truncate before sorting.
    fn capped_spec(&self, limit: usize) -> QuerySpec {
        let mut spec = self.spec.clone();
        let sorts_clientside = QueryPlanner::new(&*self.folder)
            .plan(&spec)
            .sorts_clientside();
        if limit < self.config.chunk_size && !sorts_clientside {
            spec.page_size = Some(limit);
            spec.max_items = Some(limit);
        }
        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Field;
    use crate::folder::MemoryFolder;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_positions_match_sequence_slicing() {
        // [0, 1, 2, 3, 4]
        assert_eq!(Slice::range(1, 3).positions(5), vec![1, 2]);
        assert_eq!(Slice::starting(-2).positions(5), vec![3, 4]);
        assert_eq!(Slice::until(-1).positions(5), vec![0, 1, 2, 3]);
        assert_eq!(Slice::default().step_by(-1).positions(5), vec![4, 3, 2, 1, 0]);
        assert_eq!(Slice::default().step_by(2).positions(5), vec![0, 2, 4]);
        assert_eq!(Slice::new(Some(-1), Some(0), Some(-2)).positions(5), vec![4, 2]);
        assert_eq!(Slice::range(10, 20).positions(5), Vec::<usize>::new());
        assert_eq!(Slice::starting(-10).positions(3), vec![0, 1, 2]);
    }

    #[test]
    fn test_is_negative() {
        assert!(!Slice::range(0, 10).is_negative());
        assert!(Slice::starting(-1).is_negative());
        assert!(Slice::default().step_by(-1).is_negative());
    }

    fn folder(n: i64) -> Arc<MemoryFolder> {
        let folder = MemoryFolder::new("inbox", vec![Field::simple("size")]);
        for i in 0..n {
            folder.insert([("size", json!(i))]);
        }
        Arc::new(folder)
    }

    fn sizes<I: Iterator<Item = QueryResult<Row>>>(rows: I) -> Vec<i64> {
        rows.map(|r| r.unwrap().as_flat().and_then(|v| v.as_i64()).unwrap())
            .collect()
    }

    #[test]
    fn test_lazy_slice_with_step() {
        let mut qs = QuerySet::new(folder(6))
            .order_by(&["size"])
            .unwrap()
            .values_list(&["size"], true)
            .unwrap();
        let rows = qs.slice(Slice::range(1, 6).step_by(2)).unwrap();
        assert_eq!(sizes(rows), vec![1, 3, 5]);
        assert!(!qs.is_cached());
    }

    #[test]
    fn test_empty_slice_skips_the_folder() {
        let folder = folder(3);
        let mut qs = QuerySet::new(Arc::clone(&folder));
        assert_eq!(qs.slice(Slice::until(0)).unwrap().count(), 0);
        assert_eq!(qs.slice(Slice::range(2, 1)).unwrap().count(), 0);
        assert_eq!(folder.call_count(), 0);
    }

    #[test]
    fn test_zero_step_rejected() {
        let mut qs = QuerySet::new(folder(3));
        let err = qs.slice(Slice::default().step_by(0)).err().unwrap();
        assert_eq!(err.code(), "QUERY_INVALID_OPERATION");
    }

    #[test]
    fn test_cached_index_bounds() {
        let mut qs = QuerySet::new(folder(3));
        qs.fill().unwrap();
        assert!(qs.at(2).is_ok());
        assert!(qs.at(-3).is_ok());
        assert_eq!(qs.at(3).unwrap_err(), QueryError::OutOfRange { index: 3 });
        assert_eq!(qs.at(-4).unwrap_err(), QueryError::OutOfRange { index: -4 });
    }
}
