//! Counters for the translation layer
//!
//! - Counters only, monotonic
//! - Reset only on process start
//! - Lock-free, safe to share across concurrent requests

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Registry of translation and search counters
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Queries successfully translated
    queries_translated: AtomicU64,
    /// Queries rejected before dispatch
    queries_rejected: AtomicU64,
    /// Requests that carried the computed field
    computed_fields_attached: AtomicU64,
    /// Searches that returned results
    searches_executed: AtomicU64,
    /// Searches that failed in the executor
    search_failures: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_translated(&self) {
        self.queries_translated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_computed_fields(&self) {
        self.computed_fields_attached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_searches(&self) {
        self.searches_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_search_failures(&self) {
        self.search_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_translated: self.queries_translated.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            computed_fields_attached: self.computed_fields_attached.load(Ordering::Relaxed),
            searches_executed: self.searches_executed.load(Ordering::Relaxed),
            search_failures: self.search_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_translated: u64,
    pub queries_rejected: u64,
    pub computed_fields_attached: u64,
    pub searches_executed: u64,
    pub search_failures: u64,
}
