//! In-process counters
//!
//! Counters only, monotonic, reset on process start.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Registry of service counters.
///
/// Relaxed atomics; values are exact once writers quiesce.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    surveys_submitted: AtomicU64,
    responses_stored: AtomicU64,
    submissions_rejected: AtomicU64,
    submissions_failed: AtomicU64,
    surveys_deleted: AtomicU64,
    exports_served: AtomicU64,
    export_rows: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a committed survey with its response count
    pub fn record_submission(&self, responses: u64) {
        self.surveys_submitted.fetch_add(1, Ordering::Relaxed);
        self.responses_stored.fetch_add(responses, Ordering::Relaxed);
    }

    /// Validation failure or policy conflict
    pub fn increment_rejected(&self) {
        self.submissions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Storage failure, rolled back
    pub fn increment_failed(&self) {
        self.submissions_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deleted(&self) {
        self.surveys_deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a finished export and the rows it carried
    pub fn record_export(&self, rows: u64) {
        self.exports_served.fetch_add(1, Ordering::Relaxed);
        self.export_rows.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            surveys_submitted: self.surveys_submitted.load(Ordering::Relaxed),
            responses_stored: self.responses_stored.load(Ordering::Relaxed),
            submissions_rejected: self.submissions_rejected.load(Ordering::Relaxed),
            submissions_failed: self.submissions_failed.load(Ordering::Relaxed),
            surveys_deleted: self.surveys_deleted.load(Ordering::Relaxed),
            exports_served: self.exports_served.load(Ordering::Relaxed),
            export_rows: self.export_rows.load(Ordering::Relaxed),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or_default()
    }
}

/// Point-in-time copy of every counter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub surveys_submitted: u64,
    pub responses_stored: u64,
    pub submissions_rejected: u64,
    pub submissions_failed: u64,
    pub surveys_deleted: u64,
    pub exports_served: u64,
    pub export_rows: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        assert_eq!(MetricsRegistry::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counters() {
        let registry = MetricsRegistry::new();
        registry.record_submission(20);
        registry.record_submission(20);
        registry.increment_rejected();
        registry.increment_failed();
        registry.increment_deleted();
        registry.record_export(40);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.surveys_submitted, 2);
        assert_eq!(snapshot.responses_stored, 40);
        assert_eq!(snapshot.submissions_rejected, 1);
        assert_eq!(snapshot.submissions_failed, 1);
        assert_eq!(snapshot.surveys_deleted, 1);
        assert_eq!(snapshot.exports_served, 1);
        assert_eq!(snapshot.export_rows, 40);
    }

    #[test]
    fn test_to_json() {
        let registry = MetricsRegistry::new();
        registry.record_submission(20);

        let json = registry.to_json();
        assert_eq!(json["surveys_submitted"], 1);
        assert_eq!(json["responses_stored"], 20);
        assert_eq!(json["exports_served"], 0);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(MetricsRegistry::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let reg = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    reg.record_submission(1);
                    reg.increment_rejected();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.surveys_submitted, 1000);
        assert_eq!(snapshot.submissions_rejected, 1000);
    }
}
