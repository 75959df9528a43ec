//! Observability subsystem
//!
//! Structured JSON logging of query lifecycle events.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No async or background threads
//! 4. Silent by default (minimum severity `WARN`)
//!
//! # Usage
//!
//! ```ignore
//! use folder_queryset::observability::{Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Trace);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
