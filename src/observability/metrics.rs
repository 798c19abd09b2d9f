//! Validation counters
//!
//! Counters only, monotonic, atomic with relaxed ordering. A registry is
//! passed explicitly to whoever records into it; there is no global one.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    schemas_compiled: AtomicU64,
    documents_validated: AtomicU64,
    documents_accepted: AtomicU64,
    documents_rejected: AtomicU64,
    /// Sum of errors over all rejected documents
    violations_recorded: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_schemas_compiled(&self) {
        self.schemas_compiled.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an accepted document.
    pub fn record_accepted(&self) {
        self.documents_validated.fetch_add(1, Ordering::Relaxed);
        self.documents_accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a rejected document and its violation count.
    pub fn record_rejected(&self, violations: usize) {
        self.documents_validated.fetch_add(1, Ordering::Relaxed);
        self.documents_rejected.fetch_add(1, Ordering::Relaxed);
        self.violations_recorded
            .fetch_add(violations as u64, Ordering::Relaxed);
    }

    pub fn documents_validated(&self) -> u64 {
        self.documents_validated.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            schemas_compiled: self.schemas_compiled.load(Ordering::Relaxed),
            documents_validated: self.documents_validated.load(Ordering::Relaxed),
            documents_accepted: self.documents_accepted.load(Ordering::Relaxed),
            documents_rejected: self.documents_rejected.load(Ordering::Relaxed),
            violations_recorded: self.violations_recorded.load(Ordering::Relaxed),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_default()
    }
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub schemas_compiled: u64,
    pub documents_validated: u64,
    pub documents_accepted: u64,
    pub documents_rejected: u64,
    pub violations_recorded: u64,
}
