//! Retention Metrics
//!
//! Thread-safe counters for monitoring prune runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Thread-safe metrics for tracking retention operations
#[derive(Debug, Clone)]
pub struct RetentionMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    /// Number of completed prune runs
    runs: AtomicUsize,
    /// Versions listed before selection
    versions_evaluated: AtomicUsize,
    /// Versions the selector marked for deletion
    versions_selected: AtomicUsize,
    /// Versions removed by a successful delete
    versions_deleted: AtomicUsize,
    /// Deletes answered with "not found or pending"
    versions_already_gone: AtomicUsize,
    /// Runs aborted by a list or delete failure
    failures: AtomicUsize,
    /// Total duration in milliseconds
    total_duration_ms: AtomicU64,
}

impl Default for RetentionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RetentionMetrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    pub fn record_run(&self) {
        self.inner.runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_versions_evaluated(&self, count: usize) {
        self.inner
            .versions_evaluated
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_versions_selected(&self, count: usize) {
        self.inner
            .versions_selected
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_versions_deleted(&self, count: usize) {
        self.inner
            .versions_deleted
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_versions_already_gone(&self, count: usize) {
        self.inner
            .versions_already_gone
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.inner.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duration_ms(&self, duration_ms: u64) {
        self.inner
            .total_duration_ms
            .fetch_add(duration_ms, Ordering::Relaxed);
    }

    pub fn runs(&self) -> usize {
        self.inner.runs.load(Ordering::Relaxed)
    }

    pub fn versions_evaluated(&self) -> usize {
        self.inner.versions_evaluated.load(Ordering::Relaxed)
    }

    pub fn versions_selected(&self) -> usize {
        self.inner.versions_selected.load(Ordering::Relaxed)
    }

    pub fn versions_deleted(&self) -> usize {
        self.inner.versions_deleted.load(Ordering::Relaxed)
    }

    pub fn versions_already_gone(&self) -> usize {
        self.inner.versions_already_gone.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> usize {
        self.inner.failures.load(Ordering::Relaxed)
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.inner.total_duration_ms.load(Ordering::Relaxed)
    }

    /// Emit the current counters as a single log event
    pub fn log_summary(&self) {
        tracing::info!(
            runs = self.runs(),
            versions_evaluated = self.versions_evaluated(),
            versions_selected = self.versions_selected(),
            versions_deleted = self.versions_deleted(),
            versions_already_gone = self.versions_already_gone(),
            failures = self.failures(),
            total_duration_ms = self.total_duration_ms(),
            "Retention metrics summary"
        );
    }
}
