//! Observable query events

use std::fmt;

use super::logger::Severity;

/// Events emitted while planning and consuming queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A plan was built and is about to run
    QueryPlanned,
    /// The query matches nothing; no remote call
    QueryEmpty,
    /// Results served from a filled cache
    QueryCacheHit,
    /// A full pass completed and the cache was committed
    QueryCacheFilled,
    /// A cache was dropped by a mutating operation
    QueryCacheInvalidated,
    /// Results collected for client-side ordering
    QueryClientSort,
    /// Full items fetched by identity
    QueryDirectFetch,
    /// Items deleted through the account
    QueryBulkDelete,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::QueryPlanned => "QUERY_PLANNED",
            Event::QueryEmpty => "QUERY_EMPTY",
            Event::QueryCacheHit => "QUERY_CACHE_HIT",
            Event::QueryCacheFilled => "QUERY_CACHE_FILLED",
            Event::QueryCacheInvalidated => "QUERY_CACHE_INVALIDATED",
            Event::QueryClientSort => "QUERY_CLIENT_SORT",
            Event::QueryDirectFetch => "QUERY_DIRECT_FETCH",
            Event::QueryBulkDelete => "QUERY_BULK_DELETE",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Event::QueryBulkDelete => Severity::Info,
            _ => Severity::Trace,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
