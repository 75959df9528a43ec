//! Chainable query over one folder
//!
//! Every chaining operation returns a new `QuerySet` carrying a cloned
//! `QuerySpec` and no cache. Only the folder handle and the config are
//! shared with the receiver.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::spec::QuerySpec;
use crate::config::QueryConfig;
use crate::executor::{ReturnFormat, Row};
use crate::fields::{FieldOrder, FieldPath};
use crate::folder::{CalendarView, Folder};
use crate::planner::{ExplainPlan, QueryPlanner};
use crate::queryset::{QueryError, QueryResult};
use crate::restriction::Restriction;

/// A deferred, chainable query over the items of a folder
pub struct QuerySet<F: Folder + ?Sized> {
    pub(super) folder: Arc<F>,
    pub(super) spec: QuerySpec,
    pub(super) config: QueryConfig,
    /// Set once, after a complete pass over the result stream
    pub(super) cache: Option<Arc<Vec<Row>>>,
}

impl<F: Folder + ?Sized> QuerySet<F> {
    /// Creates a query matching every item of the folder
    pub fn new(folder: Arc<F>) -> Self {
        Self::with_config(folder, QueryConfig::default())
    }

    pub fn with_config(folder: Arc<F>, config: QueryConfig) -> Self {
        Self {
            folder,
            spec: QuerySpec::default(),
            config,
            cache: None,
        }
    }

    pub fn folder(&self) -> &Arc<F> {
        &self.folder
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Whether a complete pass has filled the cache
    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    /// Derives an uncached query with the given spec
    pub(super) fn derive(&self, spec: QuerySpec) -> Self {
        Self {
            folder: Arc::clone(&self.folder),
            spec,
            config: self.config.clone(),
            cache: None,
        }
    }

    /// Uncached copy of this query
    pub fn all(&self) -> Self {
        self.derive(self.spec.clone())
    }

    /// Copy that matches nothing and never calls the folder
    pub fn none(&self) -> Self {
        let mut spec = self.spec.clone();
        spec.restriction = Restriction::Never;
        self.derive(spec)
    }

    /// Copy restricted further by `restriction`
    pub fn filter(&self, restriction: Restriction) -> Self {
        let mut spec = self.spec.clone();
        spec.restriction = spec.restriction.and(restriction);
        self.derive(spec)
    }

    /// Copy excluding everything `restriction` matches
    pub fn exclude(&self, restriction: Restriction) -> Self {
        let mut spec = self.spec.clone();
        spec.restriction = spec.restriction.and(restriction.negate());
        self.derive(spec)
    }

    /// Copy returning only the named fields
    pub fn only(&self, fields: &[&str]) -> QueryResult<Self> {
        let mut spec = self.spec.clone();
        spec.only_fields = Some(self.resolve_paths(fields, "only")?);
        Ok(self.derive(spec))
    }

    /// Copy ordered by the named fields. A leading `-` reverses a field.
    pub fn order_by(&self, fields: &[&str]) -> QueryResult<Self> {
        let orders = fields
            .iter()
            .map(|f| {
                FieldOrder::from_string(f, self.folder.as_ref())
                    .map_err(|e| e.in_operation("order_by"))
            })
            .collect::<QueryResult<Vec<_>>>()?;

        let mut spec = self.spec.clone();
        spec.order_fields = Some(orders);
        Ok(self.derive(spec))
    }

    /// Copy with every ordering direction flipped
    pub fn reverse(&self) -> QueryResult<Self> {
        if !self.spec.is_ordered() {
            return Err(QueryError::invalid_operation(
                "reverse() requires an ordering; call order_by() first",
            ));
        }
        let mut spec = self.spec.clone();
        if let Some(orders) = spec.order_fields.as_mut() {
            orders.iter_mut().for_each(FieldOrder::flip);
        }
        Ok(self.derive(spec))
    }

    /// Copy returning one map of path to value per item
    pub fn values(&self, fields: &[&str]) -> QueryResult<Self> {
        self.formatted(fields, ReturnFormat::Values, "values")
    }

    /// Copy returning one tuple per item, or one scalar when `flat`
    pub fn values_list(&self, fields: &[&str], flat: bool) -> QueryResult<Self> {
        let format = if flat {
            ReturnFormat::Flat
        } else {
            ReturnFormat::ValuesList
        };
        self.formatted(fields, format, "values_list")
    }

    /// Copy limited to items whose start lies within `[start, end]`.
    /// Server-side ordering is disabled for such queries.
    pub fn view(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> QueryResult<Self> {
        if end < start {
            return Err(QueryError::invalid_operation(format!(
                "view end {} is before start {}",
                end.to_rfc3339(),
                start.to_rfc3339()
            )));
        }
        let mut spec = self.spec.clone();
        spec.calendar_view = Some(CalendarView::new(start, end));
        Ok(self.derive(spec))
    }

    /// Copy with a page size hint
    pub fn page_size(&self, page_size: usize) -> Self {
        let mut spec = self.spec.clone();
        spec.page_size = Some(page_size);
        self.derive(spec)
    }

    /// Copy with a max items hint
    pub fn max_items(&self, max_items: usize) -> Self {
        let mut spec = self.spec.clone();
        spec.max_items = Some(max_items);
        self.derive(spec)
    }

    /// Describes how the query would run. Never calls the folder.
    pub fn explain(&self) -> ExplainPlan {
        ExplainPlan::from_plan(&QueryPlanner::new(self.folder.as_ref()).plan(&self.spec))
    }

    fn formatted(
        &self,
        fields: &[&str],
        format: ReturnFormat,
        operation: &str,
    ) -> QueryResult<Self> {
        if format == ReturnFormat::Flat && fields.len() != 1 {
            return Err(QueryError::invalid_operation(
                "flat=true requires exactly one field name",
            ));
        }
        let mut spec = self.spec.clone();
        spec.only_fields = Some(self.resolve_paths(fields, operation)?);
        spec.return_format = format;
        spec.validate()?;
        Ok(self.derive(spec))
    }

    fn resolve_paths(&self, fields: &[&str], operation: &str) -> QueryResult<Vec<FieldPath>> {
        fields
            .iter()
            .map(|f| {
                FieldPath::from_string(f, self.folder.as_ref())
                    .map_err(|e| e.in_operation(operation))
            })
            .collect()
    }
}

impl<F: Folder + ?Sized> fmt::Display for QuerySet<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QuerySet(q={}, folder='{}'",
            self.spec.restriction,
            self.folder.name()
        )?;
        if let Some(rows) = &self.cache {
            write!(f, ", len={}", rows.len())?;
        }
        write!(f, ")")
    }
}

impl<F: Folder + ?Sized> fmt::Debug for QuerySet<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySet")
            .field("folder", &self.folder.name())
            .field("spec", &self.spec)
            .field("cached", &self.cache.as_ref().map(|rows| rows.len()))
            .finish()
    }
}
