//! Query planner
//!
//! Turns a query specification into the shape of the remote call(s).
//!
//! Decisions, in order:
//! 1. A `Never` restriction yields an empty plan (no remote call)
//! 2. Effective projection: the explicit projection, or every folder
//!    field when unset, minus the identity fields which always come back
//! 3. Ordering goes to the server only for a single field outside a
//!    calendar view; otherwise it is applied client-side and any sort key
//!    missing from the projection is fetched for this call only
//! 4. Any complex field in the final projection forces find-then-fetch

use crate::fields::{FieldOrder, FieldPath};
use crate::folder::{CalendarView, FindRequest, Folder};
use crate::queryset::QuerySpec;
use crate::restriction::Restriction;

/// How a plan reaches the folder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPath {
    /// Nothing can match; no remote call
    Empty,
    /// One search call returning the projection directly
    Find,
    /// Search for identities, then fetch full items
    FindThenFetch,
}

impl AccessPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessPath::Empty => "EMPTY",
            AccessPath::Find => "FIND",
            AccessPath::FindThenFetch => "FIND_FETCH",
        }
    }
}

/// Immutable query plan
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub access: AccessPath,
    pub restriction: Restriction,
    /// Fields requested from the store, sort-only fields included
    pub additional_fields: Vec<FieldPath>,
    /// Ordering sent to the store
    pub server_order: Option<Vec<FieldOrder>>,
    /// Ordering applied after retrieval
    pub client_order: Option<Vec<FieldOrder>>,
    /// Fields fetched only to sort on, cleared before formatting
    pub sort_only_fields: Vec<FieldPath>,
    pub calendar_view: Option<CalendarView>,
    pub page_size: Option<usize>,
    pub max_items: Option<usize>,
}

impl QueryPlan {
    fn empty(restriction: Restriction) -> Self {
        Self {
            access: AccessPath::Empty,
            restriction,
            additional_fields: Vec::new(),
            server_order: None,
            client_order: None,
            sort_only_fields: Vec::new(),
            calendar_view: None,
            page_size: None,
            max_items: None,
        }
    }

    /// True when results must be collected and sorted locally
    pub fn sorts_clientside(&self) -> bool {
        self.client_order.is_some()
    }

    /// The search request for this plan.
    ///
    /// A find-then-fetch plan searches for identity pairs only.
    pub fn find_request(&self) -> FindRequest {
        let additional_fields = match self.access {
            AccessPath::Find if !self.additional_fields.is_empty() => {
                Some(self.additional_fields.clone())
            }
            _ => None,
        };
        FindRequest {
            additional_fields,
            order_fields: self.server_order.clone(),
            calendar_view: self.calendar_view,
            page_size: self.page_size,
            max_items: self.max_items,
        }
    }
}

/// Plans queries against one folder
pub struct QueryPlanner<'a, F: Folder + ?Sized> {
    folder: &'a F,
}

impl<'a, F: Folder + ?Sized> QueryPlanner<'a, F> {
    pub fn new(folder: &'a F) -> Self {
        Self { folder }
    }

    /// Plans a query. Deterministic for a given spec and folder field table.
    pub fn plan(&self, spec: &QuerySpec) -> QueryPlan {
        if spec.restriction.is_never() {
            return QueryPlan::empty(Restriction::Never);
        }

        let mut additional_fields = self.effective_projection(spec);

        let ordering = spec
            .order_fields
            .as_ref()
            .filter(|orders| !orders.is_empty());

        let must_sort_clientside = match ordering {
            Some(orders) => orders.len() > 1 || spec.calendar_view.is_some(),
            None => false,
        };

        let mut sort_only_fields = Vec::new();
        let (server_order, client_order) = match ordering {
            Some(orders) if must_sort_clientside => {
                for order in orders {
                    let path = &order.path;
                    // Stripping clears whole fields, so a field that is
                    // already projected through any path is never sort-only
                    if !path.is_identity()
                        && !additional_fields.iter().any(|p| p.field() == path.field())
                        && !sort_only_fields.contains(path)
                    {
                        sort_only_fields.push(path.clone());
                    }
                }
                additional_fields.extend(sort_only_fields.iter().cloned());
                (None, Some(orders.clone()))
            }
            Some(orders) => (Some(orders.clone()), None),
            None => (None, None),
        };

        let complex = self.folder.complex_fields();
        let complex_requested = additional_fields
            .iter()
            .any(|p| p.field().is_complex() || complex.contains(p.field()));

        QueryPlan {
            access: if complex_requested {
                AccessPath::FindThenFetch
            } else {
                AccessPath::Find
            },
            restriction: spec.restriction.clone(),
            additional_fields,
            server_order,
            client_order,
            sort_only_fields,
            calendar_view: spec.calendar_view,
            page_size: spec.page_size,
            max_items: spec.max_items,
        }
    }

    /// Requested fields minus identity fields, without duplicates
    fn effective_projection(&self, spec: &QuerySpec) -> Vec<FieldPath> {
        let candidates: Vec<FieldPath> = match &spec.only_fields {
            Some(only) => only.clone(),
            None => self
                .folder
                .allowed_fields()
                .into_iter()
                .map(FieldPath::new)
                .collect(),
        };

        let mut fields: Vec<FieldPath> = Vec::with_capacity(candidates.len());
        for path in candidates {
            if !path.is_identity() && !fields.contains(&path) {
                fields.push(path);
            }
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Field;
    use crate::folder::MemoryFolder;
    use chrono::{TimeZone, Utc};

    fn folder() -> MemoryFolder {
        MemoryFolder::new(
            "calendar",
            vec![
                Field::item_id(),
                Field::changekey(),
                Field::simple("subject"),
                Field::simple("start"),
                Field::complex("body"),
            ],
        )
    }

    fn path(name: &str) -> FieldPath {
        FieldPath::new(Field::simple(name))
    }

    fn order(name: &str, reverse: bool) -> FieldOrder {
        FieldOrder::new(path(name), reverse)
    }

    #[test]
    fn test_sibling_subfield_is_not_sort_only() {
        let folder = folder();
        let body = Field::complex("body");
        let spec = QuerySpec {
            only_fields: Some(vec![FieldPath::with_subfield(body.clone(), "text")]),
            order_fields: Some(vec![
                order("subject", false),
                FieldOrder::new(FieldPath::with_subfield(body, "lang"), false),
            ]),
            ..Default::default()
        };
        let plan = QueryPlanner::new(&folder).plan(&spec);
        assert_eq!(plan.sort_only_fields, vec![path("subject")]);
    }

    #[test]
    fn test_never_plans_empty() {
        let folder = folder();
        let spec = QuerySpec {
            restriction: Restriction::Never,
            ..Default::default()
        };
        let plan = QueryPlanner::new(&folder).plan(&spec);
        assert_eq!(plan.access, AccessPath::Empty);
    }

    #[test]
    fn test_unset_projection_uses_all_fields() {
        let folder = folder();
        let plan = QueryPlanner::new(&folder).plan(&QuerySpec::default());

        let names: Vec<String> = plan.additional_fields.iter().map(FieldPath::path).collect();
        assert_eq!(names, vec!["subject", "start", "body"]);
        // body is complex
        assert_eq!(plan.access, AccessPath::FindThenFetch);
        assert_eq!(plan.find_request().additional_fields, None);
    }

    #[test]
    fn test_simple_projection_single_phase() {
        let folder = folder();
        let spec = QuerySpec {
            only_fields: Some(vec![FieldPath::new(Field::item_id()), path("subject")]),
            ..Default::default()
        };
        let plan = QueryPlanner::new(&folder).plan(&spec);
        assert_eq!(plan.access, AccessPath::Find);
        assert_eq!(plan.additional_fields, vec![path("subject")]);
        assert_eq!(plan.find_request().additional_fields, Some(vec![path("subject")]));
    }

    #[test]
    fn test_identity_only_projection() {
        let folder = folder();
        let spec = QuerySpec {
            only_fields: Some(Vec::new()),
            ..Default::default()
        };
        let plan = QueryPlanner::new(&folder).plan(&spec);
        assert_eq!(plan.access, AccessPath::Find);
        assert_eq!(plan.find_request().additional_fields, None);
    }

    #[test]
    fn test_single_order_goes_to_server() {
        let folder = folder();
        let spec = QuerySpec {
            only_fields: Some(vec![path("subject")]),
            order_fields: Some(vec![order("start", true)]),
            ..Default::default()
        };
        let plan = QueryPlanner::new(&folder).plan(&spec);
        assert_eq!(plan.server_order, Some(vec![order("start", true)]));
        assert!(!plan.sorts_clientside());
        assert!(plan.sort_only_fields.is_empty());
    }

    #[test]
    fn test_multi_order_sorts_clientside() {
        let folder = folder();
        let spec = QuerySpec {
            only_fields: Some(vec![path("subject")]),
            order_fields: Some(vec![order("start", false), order("subject", false)]),
            ..Default::default()
        };
        let plan = QueryPlanner::new(&folder).plan(&spec);
        assert_eq!(plan.server_order, None);
        assert!(plan.sorts_clientside());
        assert_eq!(plan.sort_only_fields, vec![path("start")]);
        assert_eq!(plan.additional_fields, vec![path("subject"), path("start")]);
        assert_eq!(plan.find_request().order_fields, None);
    }

    #[test]
    fn test_calendar_view_disables_server_sort() {
        let folder = folder();
        let view = CalendarView::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        );
        let spec = QuerySpec {
            only_fields: Some(vec![path("subject")]),
            order_fields: Some(vec![order("start", false)]),
            calendar_view: Some(view),
            ..Default::default()
        };
        let plan = QueryPlanner::new(&folder).plan(&spec);
        assert_eq!(plan.server_order, None);
        assert_eq!(plan.client_order, Some(vec![order("start", false)]));
        assert_eq!(plan.find_request().calendar_view, Some(view));
    }

    #[test]
    fn test_complex_sort_key_forces_fetch() {
        let folder = folder();
        let body = FieldPath::new(Field::complex("body"));
        let spec = QuerySpec {
            only_fields: Some(vec![path("subject")]),
            order_fields: Some(vec![
                FieldOrder::new(body.clone(), false),
                order("subject", false),
            ]),
            ..Default::default()
        };
        let plan = QueryPlanner::new(&folder).plan(&spec);
        assert_eq!(plan.access, AccessPath::FindThenFetch);
        assert_eq!(plan.sort_only_fields, vec![body]);
    }

    #[test]
    fn test_identity_sort_key_not_added() {
        let folder = folder();
        let spec = QuerySpec {
            only_fields: Some(Vec::new()),
            order_fields: Some(vec![
                FieldOrder::new(FieldPath::new(Field::item_id()), false),
                order("subject", false),
            ]),
            ..Default::default()
        };
        let plan = QueryPlanner::new(&folder).plan(&spec);
        assert_eq!(plan.sort_only_fields, vec![path("subject")]);
    }

    #[test]
    fn test_paging_hints_pass_through() {
        let folder = folder();
        let spec = QuerySpec {
            only_fields: Some(vec![path("subject")]),
            page_size: Some(7),
            max_items: Some(7),
            ..Default::default()
        };
        let request = QueryPlanner::new(&folder).plan(&spec).find_request();
        assert_eq!(request.page_size, Some(7));
        assert_eq!(request.max_items, Some(7));
    }
}
