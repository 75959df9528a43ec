//! In-memory folder
//!
//! Behaves like a remote store for the query layer: it filters, orders
//! on request, truncates at `max_items`, refuses complex fields in a
//! search and records every call it receives.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::errors::{FolderError, FolderResult};
use super::filter::RestrictionFilter;
use super::{CalendarView, DeleteSummary, Folder, FindRequest, FoundStream};
use crate::executor::ResultSorter;
use crate::fields::{Field, FieldPath};
use crate::item::{Found, Item, ItemIdentity};
use crate::restriction::Restriction;

/// Field compared against a calendar view
const VIEW_FIELD: &str = "start";

/// A call received by a `MemoryFolder`
#[derive(Debug, Clone, PartialEq)]
pub enum FolderCall {
    Find {
        restriction: Restriction,
        request: FindRequest,
    },
    Fetch {
        ids: Vec<ItemIdentity>,
        fields: Option<Vec<String>>,
    },
    BulkDelete {
        ids: Vec<ItemIdentity>,
    },
}

#[derive(Debug, Default)]
struct MemoryState {
    items: Vec<Item>,
    calls: Vec<FolderCall>,
    fail_after: Option<usize>,
}

/// Folder backed by a vector of items
#[derive(Debug)]
pub struct MemoryFolder {
    name: String,
    fields: Vec<Field>,
    state: Mutex<MemoryState>,
}

impl MemoryFolder {
    /// Creates an empty folder supporting the given fields
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Inserts an item with fresh identity and returns it
    pub fn insert<K, I>(&self, values: I) -> ItemIdentity
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let identity = ItemIdentity::new(Uuid::new_v4().to_string(), Uuid::new_v4().to_string());
        let mut item = Item::from(identity.clone());
        for (k, v) in values {
            item.set(k, v);
        }
        self.state().items.push(item);
        identity
    }

    /// Replaces the values of an existing item and rolls its changekey
    pub fn update<K, I>(&self, item_id: &str, values: I) -> FolderResult<ItemIdentity>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut state = self.state();
        let item = state
            .items
            .iter_mut()
            .find(|i| i.item_id.as_deref() == Some(item_id))
            .ok_or_else(|| FolderError::ItemNotFound(item_id.to_string()))?;
        for (k, v) in values {
            item.set(k, v);
        }
        let changekey = Uuid::new_v4().to_string();
        item.changekey = Some(changekey.clone());
        Ok(ItemIdentity::new(item_id, changekey))
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.state().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<FolderCall> {
        self.state().calls.clone()
    }

    /// Requests of the search calls received so far
    pub fn find_requests(&self) -> Vec<FindRequest> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                FolderCall::Find { request, .. } => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of remote calls received so far
    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Makes every following search stream fail after `n` results
    pub fn fail_streams_after(&self, n: Option<usize>) {
        self.state().fail_after = n;
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_searchable(&self, fields: &[FieldPath]) -> FolderResult<()> {
        for path in fields {
            if path.is_identity() {
                continue;
            }
            let known = self.fields.iter().find(|f| f.name() == path.field().name());
            match known {
                None => return Err(FolderError::UnsupportedField(path.path())),
                Some(f) if f.is_complex() => return Err(FolderError::UnsupportedField(path.path())),
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn in_view(item: &Item, view: &CalendarView) -> bool {
        item.get(VIEW_FIELD)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .is_some_and(|at| view.contains(at.with_timezone(&Utc)))
    }
}

fn field_names(fields: &[FieldPath]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for path in fields {
        let name = path.field().name().to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

impl Folder for MemoryFolder {
    fn name(&self) -> &str {
        &self.name
    }

    fn allowed_fields(&self) -> Vec<Field> {
        self.fields.clone()
    }

    fn find_items(
        &self,
        restriction: &Restriction,
        request: &FindRequest,
    ) -> FolderResult<FoundStream<'_>> {
        let mut state = self.state();
        state.calls.push(FolderCall::Find {
            restriction: restriction.clone(),
            request: request.clone(),
        });

        if let Some(fields) = &request.additional_fields {
            self.check_searchable(fields)?;
        }

        let mut matched: Vec<Found> = state
            .items
            .iter()
            .filter(|item| RestrictionFilter::matches(item, restriction))
            .filter(|item| match &request.calendar_view {
                Some(view) => Self::in_view(item, view),
                None => true,
            })
            .cloned()
            .map(Found::Item)
            .collect();

        if let Some(orders) = &request.order_fields {
            if request.calendar_view.is_some() {
                return Err(FolderError::Service(
                    "sorting is not supported for calendar views".into(),
                ));
            }
            ResultSorter::sort(&mut matched, orders);
        }

        if let Some(max) = request.max_items {
            matched.truncate(max);
        }

        let mut results: Vec<FolderResult<Found>> = Vec::with_capacity(matched.len());
        for found in matched {
            let item = found.into_item();
            let projected = match &request.additional_fields {
                None => match item.identity() {
                    Some(identity) => Ok(Found::Identity(identity)),
                    None => Err(FolderError::MalformedResponse("item without identity".into())),
                },
                Some(fields) => {
                    let names = field_names(fields);
                    Ok(Found::Item(item.project(names.iter().map(String::as_str))))
                }
            };
            results.push(projected);
        }

        if let Some(n) = state.fail_after {
            if n < results.len() {
                results.truncate(n);
                results.push(Err(FolderError::Service("connection reset".into())));
            }
        }

        Ok(Box::new(results.into_iter()))
    }

    fn fetch(
        &self,
        ids: Vec<ItemIdentity>,
        fields: Option<&[FieldPath]>,
    ) -> FolderResult<FoundStream<'_>> {
        let mut state = self.state();
        state.calls.push(FolderCall::Fetch {
            ids: ids.clone(),
            fields: fields.map(field_names),
        });

        let names = fields.map(field_names);
        let results: Vec<FolderResult<Found>> = ids
            .iter()
            .map(|id| {
                let item = state
                    .items
                    .iter()
                    .find(|i| i.item_id.as_deref() == Some(id.item_id.as_str()))
                    .ok_or_else(|| FolderError::ItemNotFound(id.item_id.clone()))?;
                if item.changekey.as_deref() != Some(id.changekey.as_str()) {
                    return Err(FolderError::StaleChangeKey(id.item_id.clone()));
                }
                Ok(Found::Item(match &names {
                    Some(names) => item.project(names.iter().map(String::as_str)),
                    None => item.clone(),
                }))
            })
            .collect();

        Ok(Box::new(results.into_iter()))
    }

    fn bulk_delete(&self, ids: Vec<ItemIdentity>) -> FolderResult<DeleteSummary> {
        let mut state = self.state();
        state.calls.push(FolderCall::BulkDelete { ids: ids.clone() });

        let mut summary = DeleteSummary {
            requested: ids.len(),
            ..Default::default()
        };
        for id in ids {
            let before = state.items.len();
            state
                .items
                .retain(|i| i.item_id.as_deref() != Some(id.item_id.as_str()));
            if state.items.len() < before {
                summary.deleted += 1;
            } else {
                summary.failures.push((id.item_id, "item not found".into()));
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldOrder;
    use serde_json::json;

    fn folder() -> MemoryFolder {
        let folder = MemoryFolder::new(
            "inbox",
            vec![
                Field::simple("subject"),
                Field::simple("size"),
                Field::complex("body"),
            ],
        );
        folder.insert([("subject", json!("b")), ("size", json!(2))]);
        folder.insert([("subject", json!("a")), ("size", json!(1))]);
        folder.insert([("subject", json!("c")), ("size", json!(3))]);
        folder
    }

    fn path(name: &str) -> FieldPath {
        FieldPath::new(Field::simple(name))
    }

    #[test]
    fn test_find_identity_only() {
        let folder = folder();
        let results: Vec<_> = folder
            .find_items(&Restriction::All, &FindRequest::default())
            .unwrap()
            .collect::<FolderResult<_>>()
            .unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|f| matches!(f, Found::Identity(_))));
        assert_eq!(folder.call_count(), 1);
    }

    #[test]
    fn test_find_sorted_and_truncated() {
        let folder = folder();
        let request = FindRequest {
            additional_fields: Some(vec![path("subject")]),
            order_fields: Some(vec![FieldOrder::new(path("size"), true)]),
            max_items: Some(2),
            ..Default::default()
        };
        let results: Vec<Found> = folder
            .find_items(&Restriction::All, &request)
            .unwrap()
            .collect::<FolderResult<_>>()
            .unwrap();
        let subjects: Vec<Value> = results.iter().map(|f| path("subject").get_value(f)).collect();
        assert_eq!(subjects, vec![json!("c"), json!("b")]);
        // size was not requested
        assert_eq!(path("size").get_value(&results[0]), Value::Null);
    }

    #[test]
    fn test_find_rejects_complex_fields() {
        let folder = folder();
        let request = FindRequest {
            additional_fields: Some(vec![FieldPath::new(Field::complex("body"))]),
            ..Default::default()
        };
        let err = folder.find_items(&Restriction::All, &request).err().unwrap();
        assert_eq!(err, FolderError::UnsupportedField("body".into()));
    }

    #[test]
    fn test_fetch_checks_changekey() {
        let folder = folder();
        let id = folder.insert([("subject", json!("d"))]);
        let stale = ItemIdentity::new(id.item_id.clone(), "old");

        let results: Vec<_> = folder.fetch(vec![id, stale], None).unwrap().collect();
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(FolderError::StaleChangeKey(_))));
    }

    #[test]
    fn test_injected_failure() {
        let folder = folder();
        folder.fail_streams_after(Some(1));
        let results: Vec<_> = folder
            .find_items(&Restriction::All, &FindRequest::default())
            .unwrap()
            .collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_bulk_delete() {
        let folder = folder();
        let id = folder.insert([("subject", json!("gone"))]);
        let summary = folder
            .bulk_delete(vec![id, ItemIdentity::new("missing", "x")])
            .unwrap();
        assert_eq!(summary.requested, 2);
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(folder.len(), 3);
    }

    #[test]
    fn test_update_rolls_changekey() {
        let folder = folder();
        let id = folder.insert([("subject", json!("v1"))]);
        let updated = folder.update(&id.item_id, [("subject", json!("v2"))]).unwrap();
        assert_eq!(updated.item_id, id.item_id);
        assert_ne!(updated.changekey, id.changekey);
    }
}
