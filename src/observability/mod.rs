//! Observability for the translation layer
//!
//! - Structured logging (JSON, one line per event)
//! - Lock-free counters
//!
//! Observability is read-only: it never changes how a request is translated.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a typed event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
