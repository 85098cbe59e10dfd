//! Observable events of the translation layer
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Logical query rewritten into a physical request
    QueryTranslated,
    /// Computed field added because its logical name was referenced
    ComputedFieldAttached,
    /// Request rejected before dispatch
    QueryRejected,
    /// Executor returned results
    SearchCompleted,
    /// Executor reported a failure
    SearchFailed,
    /// Configuration file loaded
    ConfigLoaded,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::QueryTranslated => "QUERY_TRANSLATED",
            Event::ComputedFieldAttached => "COMPUTED_FIELD_ATTACHED",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::SearchCompleted => "SEARCH_COMPLETED",
            Event::SearchFailed => "SEARCH_FAILED",
            Event::ConfigLoaded => "CONFIG_LOADED",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Event::QueryRejected => Severity::Warn,
            Event::SearchFailed => Severity::Error,
            Event::ComputedFieldAttached => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
