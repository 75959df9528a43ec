//! Lazy Evaluation and Cache Tests
//!
//! Tests for the consumption contract:
//! - Chaining never calls the folder and never touches the receiver
//! - A complete pass fills the cache; later passes make no calls
//! - A partial or failed pass leaves the cache unset
//! - A query matching nothing never calls the folder

use std::sync::Arc;

use folder_queryset::folder::FolderCall;
use folder_queryset::{Field, MemoryFolder, QueryResult, QuerySet, Restriction, Row};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn inbox(n: i64) -> Arc<MemoryFolder> {
    let folder = MemoryFolder::new(
        "inbox",
        vec![
            Field::simple("subject"),
            Field::simple("size"),
            Field::complex("body"),
        ],
    );
    for i in 0..n {
        folder.insert([
            ("subject", json!(format!("message {}", i))),
            ("size", json!(i * 10)),
            ("body", json!({ "text": format!("body {}", i) })),
        ]);
    }
    Arc::new(folder)
}

fn find_calls(folder: &MemoryFolder) -> usize {
    folder
        .calls()
        .iter()
        .filter(|c| matches!(c, FolderCall::Find { .. }))
        .count()
}

fn collect(rows: impl Iterator<Item = QueryResult<Row>>) -> Vec<Row> {
    rows.collect::<QueryResult<Vec<_>>>().unwrap()
}

// =============================================================================
// Deferred Execution Tests
// =============================================================================

/// Building a chain issues no remote call.
#[test]
fn test_chaining_is_deferred() {
    let folder = inbox(3);
    let qs = QuerySet::new(Arc::clone(&folder))
        .filter(Restriction::gt("size", json!(0)))
        .exclude(Restriction::contains("subject", "2"))
        .only(&["subject", "body"])
        .unwrap()
        .order_by(&["-size", "subject"])
        .unwrap()
        .reverse()
        .unwrap();

    assert!(!qs.is_cached());
    assert_eq!(folder.call_count(), 0);
}

/// The receiver's spec and cache survive every chaining operation.
#[test]
fn test_copy_isolation() {
    let folder = inbox(3);
    let mut base = QuerySet::new(Arc::clone(&folder)).order_by(&["size"]).unwrap();
    base.fill().unwrap();
    let spec = base.spec().clone();

    let derived = [
        base.all(),
        base.none(),
        base.filter(Restriction::eq("size", json!(10))),
        base.exclude(Restriction::eq("size", json!(10))),
        base.only(&["subject"]).unwrap(),
        base.order_by(&["-subject"]).unwrap(),
        base.reverse().unwrap(),
        base.values(&["subject"]).unwrap(),
        base.values_list(&["size"], true).unwrap(),
        base.page_size(2),
        base.max_items(2),
    ];

    assert_eq!(base.spec(), &spec);
    assert!(base.is_cached());
    assert!(derived.iter().all(|qs| !qs.is_cached()));
}

// =============================================================================
// Cache Tests
// =============================================================================

/// A second full pass is served from the cache with identical order.
#[test]
fn test_cache_hit_after_full_pass() {
    let folder = inbox(5);
    let mut qs = QuerySet::new(Arc::clone(&folder)).order_by(&["-size"]).unwrap();

    let first = collect(qs.iter().unwrap());
    let calls = folder.call_count();
    let second = collect(qs.iter().unwrap());

    assert_eq!(first, second);
    assert_eq!(first.len(), 5);
    assert_eq!(folder.call_count(), calls);
}

/// Consuming 2 of 5 rows then iterating again re-runs the whole plan.
#[test]
fn test_partial_consumption_reexecutes() {
    let folder = inbox(5);
    let mut qs = QuerySet::new(Arc::clone(&folder));

    {
        let mut iter = qs.iter().unwrap();
        assert!(iter.next().is_some());
        assert!(iter.next().is_some());
    }
    assert!(!qs.is_cached());
    assert_eq!(find_calls(&folder), 1);

    let rows = qs.to_vec().unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(find_calls(&folder), 2);
    assert!(qs.is_cached());
}

/// A folder failure mid-stream propagates and commits nothing.
#[test]
fn test_failure_leaves_cache_unset() {
    let folder = inbox(5);
    folder.fail_streams_after(Some(3));
    let mut qs = QuerySet::new(Arc::clone(&folder));

    let err = qs.to_vec().unwrap_err();
    assert_eq!(err.code(), "QUERY_FOLDER_FAILED");
    assert!(!qs.is_cached());

    folder.fail_streams_after(None);
    assert_eq!(qs.to_vec().unwrap().len(), 5);
    assert!(qs.is_cached());
}

/// `stream()` never fills the cache.
#[test]
fn test_stream_is_uncached() {
    let folder = inbox(4);
    let qs = QuerySet::new(Arc::clone(&folder));

    assert_eq!(collect(qs.stream().unwrap()).len(), 4);
    assert_eq!(collect(qs.stream().unwrap()).len(), 4);
    assert!(!qs.is_cached());
    assert_eq!(find_calls(&folder), 2);
}

/// Display reports the cached length.
#[test]
fn test_display_with_cache() {
    let mut qs = QuerySet::new(inbox(2));
    assert_eq!(qs.to_string(), "QuerySet(q=ALL, folder='inbox')");
    qs.fill().unwrap();
    assert_eq!(qs.to_string(), "QuerySet(q=ALL, folder='inbox', len=2)");
}

// =============================================================================
// Empty Restriction Tests
// =============================================================================

/// `none()` makes zero calls for every consumption path.
#[test]
fn test_none_makes_no_calls() {
    let folder = inbox(3);
    let mut qs = QuerySet::new(Arc::clone(&folder)).none();

    assert!(qs.to_vec().unwrap().is_empty());
    assert_eq!(qs.count().unwrap(), 0);
    assert!(!qs.exists().unwrap());
    assert!(qs.none().stream().unwrap().next().is_none());
    assert_eq!(qs.none().at(0).unwrap_err().code(), "QUERY_OUT_OF_RANGE");
    assert_eq!(qs.delete().unwrap().requested, 0);

    assert_eq!(folder.call_count(), 0);
}

/// Filtering a `none()` query keeps it empty.
#[test]
fn test_filter_after_none() {
    let folder = inbox(3);
    let mut qs = QuerySet::new(Arc::clone(&folder))
        .none()
        .filter(Restriction::gte("size", json!(0)));

    assert!(qs.to_vec().unwrap().is_empty());
    assert_eq!(folder.call_count(), 0);
}
