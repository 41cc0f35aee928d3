//! Retention Enforcement
//!
//! A prune run lists the application's versions, selects the ones its policy
//! no longer keeps, and deletes them through the [`Pruner`].
//!
//! ## Safety Guarantees
//!
//! - Every run selects from a fresh listing; nothing is cached between runs
//! - Dry-run mode logs the selection without deleting anything
//! - A failed listing deletes nothing

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::config::RetentionConfig;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::RetentionError;
use crate::metrics::RetentionMetrics;
use crate::policy::{RetentionPolicy, RetentionPolicyResolver, RetentionPolicySource};
use crate::pruner::Pruner;
use crate::selector::select_versions_to_delete;
use crate::store::VersionStore;

/// Result of a completed prune run for one application
#[derive(Debug, Clone, Serialize)]
pub struct PruneReport {
    pub run_id: String,
    pub application: String,
    pub policy: RetentionPolicy,
    pub policy_source: RetentionPolicySource,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub versions_evaluated: usize,
    /// Labels chosen for deletion, newest first
    pub selected: Vec<String>,
    pub deleted: usize,
    pub already_gone: usize,
    pub dry_run: bool,
}

/// Coordinates listing, selection and deletion for an application.
pub struct RetentionEnforcer {
    store: Arc<dyn VersionStore>,
    policy_resolver: RetentionPolicyResolver,
    pruner: Pruner,
    metrics: RetentionMetrics,
    dry_run: bool,
}

impl RetentionEnforcer {
    pub fn new(
        store: Arc<dyn VersionStore>,
        config: RetentionConfig,
        metrics: RetentionMetrics,
    ) -> Result<Self, RetentionError> {
        let policy_resolver = RetentionPolicyResolver::new(config)?;
        let dry_run = policy_resolver.dry_run();

        Ok(Self {
            pruner: Pruner::new(store.clone(), metrics.clone()),
            store,
            policy_resolver,
            metrics,
            dry_run,
        })
    }

    /// Override the configured dry-run setting.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn policy_resolver(&self) -> &RetentionPolicyResolver {
        &self.policy_resolver
    }

    pub fn pruner(&self) -> &Pruner {
        &self.pruner
    }

    pub fn metrics(&self) -> &RetentionMetrics {
        &self.metrics
    }

    /// Prune `application` under its configured policy.
    pub async fn enforce(&self, application: &str) -> Result<PruneReport, RetentionError> {
        let resolved = self.policy_resolver.resolve(application);
        self.run(application, resolved.policy, resolved.source, self.dry_run).await
    }

    /// Prune `application` under its configured policy, deleting even when
    /// dry-run is enabled.
    pub async fn enforce_live(&self, application: &str) -> Result<PruneReport, RetentionError> {
        let resolved = self.policy_resolver.resolve(application);
        self.run(application, resolved.policy, resolved.source, false).await
    }

    /// Prune `application` under an explicit policy, ignoring configuration.
    pub async fn enforce_with_policy(
        &self,
        application: &str,
        policy: RetentionPolicy,
    ) -> Result<PruneReport, RetentionError> {
        self.run(application, policy, RetentionPolicySource::Explicit, self.dry_run).await
    }

    /// Labels `policy` would delete right now, without deleting anything.
    pub async fn plan(
        &self,
        application: &str,
        policy: &RetentionPolicy,
    ) -> Result<Vec<String>, RetentionError> {
        let versions = self.list(application).await?;
        Ok(select_versions_to_delete(&versions, policy, Utc::now()))
    }

    async fn list(
        &self,
        application: &str,
    ) -> Result<Vec<common::ApplicationVersion>, RetentionError> {
        self.store
            .list_versions(application)
            .await
            .map_err(|source| {
                warn!(
                    application = %application,
                    error = %source,
                    "Failed to list versions"
                );
                self.metrics.record_failure();
                RetentionError::ListFailure {
                    application: application.to_string(),
                    source,
                }
            })
    }

    async fn run(
        &self,
        application: &str,
        policy: RetentionPolicy,
        policy_source: RetentionPolicySource,
        dry_run: bool,
    ) -> Result<PruneReport, RetentionError> {
        let run_id = format!("prune_{}", Uuid::new_v4());
        let started_at = Utc::now();

        info!(
            application = %application,
            run_id = %run_id,
            policy = %policy,
            source = ?policy_source,
            dry_run,
            "Starting prune run"
        );

        if policy.is_unconstrained() {
            warn!(
                application = %application,
                run_id = %run_id,
                "Policy sets no constraints, every version is selected"
            );
        }

        let versions = self.list(application).await?;
        self.metrics.record_versions_evaluated(versions.len());

        let selected = select_versions_to_delete(&versions, &policy, Utc::now());
        self.metrics.record_versions_selected(selected.len());

        info!(
            application = %application,
            run_id = %run_id,
            versions_evaluated = versions.len(),
            selected_count = selected.len(),
            "Selected versions for deletion"
        );

        let (deleted, already_gone) = if selected.is_empty() {
            (0, 0)
        } else if dry_run {
            for label in &selected {
                info!(
                    application = %application,
                    run_id = %run_id,
                    label = %label,
                    "[DRY RUN] Would delete version"
                );
            }
            (0, 0)
        } else {
            let tally = self.pruner.prune(application, &selected).await?;
            (tally.deleted, tally.already_gone)
        };

        let completed_at = Utc::now();
        let duration_ms = (completed_at - started_at).num_milliseconds().max(0) as u64;
        self.metrics.record_duration_ms(duration_ms);
        self.metrics.record_run();

        info!(
            application = %application,
            run_id = %run_id,
            deleted,
            already_gone,
            duration_ms,
            "Prune run completed"
        );

        Ok(PruneReport {
            run_id,
            application: application.to_string(),
            policy,
            policy_source,
            started_at,
            completed_at,
            versions_evaluated: versions.len(),
            selected,
            deleted,
            already_gone,
            dry_run,
        })
    }
}
