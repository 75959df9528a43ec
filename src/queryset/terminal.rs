//! Terminal operations
//!
//! `get`, `count`, `exists` and `delete`. Each either answers from a
//! filled cache or runs a specialised copy of the query that asks the
//! folder for identity pairs only.

use super::iter::row_stream;
use super::queryset::QuerySet;
use super::spec::QuerySpec;
use crate::executor::{ResultFormatter, ReturnFormat, Row};
use crate::fields::FieldPath;
use crate::folder::{DeleteSummary, Folder};
use crate::item::ItemIdentity;
use crate::observability::{log_event_with_fields, Event};
use crate::queryset::{QueryError, QueryResult};
use crate::restriction::Restriction;

/// What `QuerySet::get` looks for
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// The query as it stands
    Current,
    /// One item by identity, fetched directly without a search
    Identity(ItemIdentity),
    /// The query further restricted
    Matching(Restriction),
}

impl From<ItemIdentity> for Lookup {
    fn from(identity: ItemIdentity) -> Self {
        Lookup::Identity(identity)
    }
}

impl From<Restriction> for Lookup {
    fn from(restriction: Restriction) -> Self {
        Lookup::Matching(restriction)
    }
}

impl<F: Folder + ?Sized> QuerySet<F> {
    /// The single row matching `lookup`
    pub fn get(&mut self, lookup: impl Into<Lookup>) -> QueryResult<Row> {
        let rows = match lookup.into() {
            Lookup::Current => self.cached_rows()?.as_ref().clone(),
            Lookup::Identity(identity) => self.fetch_one(identity)?,
            Lookup::Matching(restriction) => self.filter(restriction).to_vec()?,
        };

        let count = rows.len();
        let mut rows = rows.into_iter();
        match (rows.next(), count) {
            (None, _) => Err(QueryError::DoesNotExist),
            (Some(row), 1) => Ok(row),
            (Some(_), count) => Err(QueryError::MultipleObjectsReturned { count }),
        }
    }

    fn fetch_one(&self, identity: ItemIdentity) -> QueryResult<Vec<Row>> {
        let formatter =
            ResultFormatter::new(self.spec.return_format, self.spec.only_fields.clone())?;
        let fields: Option<Vec<FieldPath>> = self.spec.only_fields.as_ref().map(|only| {
            only.iter()
                .filter(|p| !p.is_identity())
                .cloned()
                .collect()
        });

        self.folder
            .fetch(vec![identity], fields.as_deref())?
            .map(|r| r.map(|found| formatter.format(found)).map_err(QueryError::from))
            .collect()
    }

    /// Number of matching items. Uses the cache when filled, otherwise
    /// streams identity pairs.
    pub fn count(&self) -> QueryResult<usize> {
        if let Some(rows) = &self.cache {
            return Ok(rows.len());
        }

        let spec = self.identity_spec(self.config.count_page_size);
        let mut count = 0;
        for row in row_stream(&*self.folder, &spec)? {
            row?;
            count += 1;
        }
        Ok(count)
    }

    /// Same as `count`
    pub fn len(&self) -> QueryResult<usize> {
        self.count()
    }

    pub fn exists(&self) -> QueryResult<bool> {
        Ok(self.count()? > 0)
    }

    pub fn is_empty(&self) -> QueryResult<bool> {
        Ok(!self.exists()?)
    }

    /// Deletes every matching item and drops the cache.
    ///
    /// The cache is dropped even when the delete fails.
    pub fn delete(&mut self) -> QueryResult<DeleteSummary> {
        let cached = self.cache.take();
        if let Some(rows) = &cached {
            log_event_with_fields(
                Event::QueryCacheInvalidated,
                &[("rows", &rows.len().to_string())],
            );
        }

        let from_cache = cached.and_then(|rows| {
            rows.iter()
                .map(Row::identity)
                .collect::<Option<Vec<ItemIdentity>>>()
        });

        let ids = match from_cache {
            Some(ids) => ids,
            None => {
                let spec = self.identity_spec(self.config.delete_page_size);
                row_stream(&*self.folder, &spec)?
                    .map(|row| {
                        row.and_then(|row| {
                            row.identity().ok_or_else(|| {
                                QueryError::invalid_operation("result row carries no identity")
                            })
                        })
                    })
                    .collect::<QueryResult<Vec<_>>>()?
            }
        };

        if ids.is_empty() {
            return Ok(DeleteSummary::default());
        }

        let summary = self.folder.bulk_delete(ids)?;
        log_event_with_fields(
            Event::QueryBulkDelete,
            &[
                ("deleted", &summary.deleted.to_string()),
                ("failed", &summary.failures.len().to_string()),
                ("folder", self.folder.name()),
                ("requested", &summary.requested.to_string()),
            ],
        );
        Ok(summary)
    }

    /// Unordered copy of the spec that returns bare identity pairs
    fn identity_spec(&self, page_size: usize) -> QuerySpec {
        QuerySpec {
            only_fields: Some(Vec::new()),
            order_fields: None,
            return_format: ReturnFormat::Items,
            page_size: Some(page_size),
            ..self.spec.clone()
        }
    }
}
