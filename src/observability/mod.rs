//! Observability for docrule
//!
//! - Structured JSON logging to stderr
//! - Atomic validation counters
//! - Typed lifecycle events
//!
//! Observability is read-only: nothing here changes a validation outcome,
//! and a failed log write is ignored.
//!
//! ```ignore
//! use docrule::observability::{log_event_with_fields, Event, MetricsRegistry};
//!
//! log_event_with_fields(Event::SchemasLoaded, &[("count", "3")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.record_rejected(2);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

fn severity_for(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else if event.is_warning() {
        Severity::Warn
    } else {
        Severity::Info
    }
}

/// Logs a lifecycle event.
pub fn log_event(event: Event) {
    Logger::log(severity_for(event), event.as_str(), &[]);
}

/// Logs a lifecycle event with fields.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_for(event), event.as_str(), fields);
}
