//! Sequential deletion of selected versions.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::RetentionError;
use crate::metrics::RetentionMetrics;
use crate::store::VersionStore;

/// Outcome of a completed prune.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PruneTally {
    /// Versions removed by this call.
    pub deleted: usize,
    /// Versions the store reported as absent or already being removed.
    pub already_gone: usize,
}

/// Deletes versions one at a time, in the order given.
///
/// A "not found or pending" answer counts as success. Any other store error
/// stops the loop and is returned; the remaining labels are left alone and a
/// retry has to start again from a fresh listing.
#[derive(Clone)]
pub struct Pruner {
    store: Arc<dyn VersionStore>,
    metrics: RetentionMetrics,
}

impl Pruner {
    pub fn new(store: Arc<dyn VersionStore>, metrics: RetentionMetrics) -> Self {
        Self { store, metrics }
    }

    pub async fn prune(
        &self,
        application: &str,
        labels: &[String],
    ) -> Result<PruneTally, RetentionError> {
        let mut tally = PruneTally::default();
        let mut issued: HashSet<&str> = HashSet::with_capacity(labels.len());

        for label in labels {
            if !issued.insert(label.as_str()) {
                debug!(application = %application, label = %label, "Skipping repeated label");
                continue;
            }

            match self.store.delete_version(application, label).await {
                Ok(()) => {
                    info!(application = %application, label = %label, "Version deleted");
                    tally.deleted += 1;
                    self.metrics.record_versions_deleted(1);
                }
                Err(e) if e.is_already_gone() => {
                    info!(
                        application = %application,
                        label = %label,
                        reason = %e,
                        "Version already gone"
                    );
                    tally.already_gone += 1;
                    self.metrics.record_versions_already_gone(1);
                }
                Err(e) => {
                    warn!(
                        application = %application,
                        label = %label,
                        error = %e,
                        remaining = labels.len() - issued.len(),
                        "Version delete failed, aborting prune"
                    );
                    self.metrics.record_failure();
                    return Err(RetentionError::DeleteFailure {
                        application: application.to_string(),
                        label: label.clone(),
                        source: e,
                    });
                }
            }
        }

        Ok(tally)
    }
}
