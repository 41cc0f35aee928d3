//! Version lifecycle: register, describe, update and delete.
//!
//! Register, describe and update pass straight through to the store. Delete
//! is where retention comes in: with no constraints configured for the
//! application only the named version is removed, otherwise the whole
//! application is pruned under its policy.

use std::sync::Arc;

use common::{ApplicationVersion, RegisterVersion};
use serde::Serialize;
use tracing::{debug, info};

use crate::enforcer::{PruneReport, RetentionEnforcer};
use crate::error::RetentionError;
use crate::store::VersionStore;

/// What a [`VersionManager::delete`] call did.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// Only the named version was targeted.
    Single { label: String, already_gone: bool },
    /// The application was pruned under its retention policy.
    Pruned(PruneReport),
}

pub struct VersionManager {
    store: Arc<dyn VersionStore>,
    enforcer: RetentionEnforcer,
}

impl VersionManager {
    pub fn new(store: Arc<dyn VersionStore>, enforcer: RetentionEnforcer) -> Self {
        Self { store, enforcer }
    }

    pub fn enforcer(&self) -> &RetentionEnforcer {
        &self.enforcer
    }

    /// Register a version and read it back.
    ///
    /// `None` means the store accepted the version but does not list it yet.
    pub async fn register(
        &self,
        request: RegisterVersion,
    ) -> Result<Option<ApplicationVersion>, RetentionError> {
        let application = request.application.clone();
        let label = request.label.clone();
        debug!(application = %application, label = %label, "Registering version");

        self.store
            .create_version(request)
            .await
            .map_err(|source| RetentionError::RegisterFailure {
                application: application.clone(),
                label: label.clone(),
                source,
            })?;

        info!(application = %application, label = %label, "Version registered");
        self.describe(&application, &label).await
    }

    /// Look up a single version.
    ///
    /// # Errors
    ///
    /// [`RetentionError::MultipleMatch`] when the store returns more than one
    /// version for the label.
    pub async fn describe(
        &self,
        application: &str,
        label: &str,
    ) -> Result<Option<ApplicationVersion>, RetentionError> {
        let mut versions = self
            .store
            .describe_versions(application, &[label.to_string()])
            .await
            .map_err(|source| RetentionError::DescribeFailure {
                application: application.to_string(),
                label: label.to_string(),
                source,
            })?;

        match versions.len() {
            0 => {
                debug!(application = %application, label = %label, "Version not found");
                Ok(None)
            }
            1 => Ok(versions.pop()),
            count => Err(RetentionError::MultipleMatch {
                application: application.to_string(),
                label: label.to_string(),
                count,
            }),
        }
    }

    /// Every listed version of `application`, newest first.
    pub async fn list(
        &self,
        application: &str,
    ) -> Result<Vec<ApplicationVersion>, RetentionError> {
        let mut versions = self
            .store
            .list_versions(application)
            .await
            .map_err(|source| RetentionError::ListFailure {
                application: application.to_string(),
                source,
            })?;
        versions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(versions)
    }

    /// Replace a version's description and read it back.
    pub async fn update_description(
        &self,
        application: &str,
        label: &str,
        description: &str,
    ) -> Result<Option<ApplicationVersion>, RetentionError> {
        debug!(
            application = %application,
            label = %label,
            description = %description,
            "Updating version description"
        );

        self.store
            .update_description(application, label, description)
            .await
            .map_err(|source| RetentionError::UpdateFailure {
                application: application.to_string(),
                label: label.to_string(),
                source,
            })?;

        self.describe(application, label).await
    }

    /// Delete a version, applying the application's retention policy.
    ///
    /// Both paths ignore dry-run: a delete is an explicit request.
    pub async fn delete(
        &self,
        application: &str,
        label: &str,
    ) -> Result<DeleteOutcome, RetentionError> {
        let resolved = self.enforcer.policy_resolver().resolve(application);

        if resolved.policy.is_unconstrained() {
            let tally = self
                .enforcer
                .pruner()
                .prune(application, &[label.to_string()])
                .await?;
            return Ok(DeleteOutcome::Single {
                label: label.to_string(),
                already_gone: tally.already_gone > 0,
            });
        }

        info!(
            application = %application,
            label = %label,
            policy = %resolved.policy,
            "Deleting under retention policy"
        );
        let report = self.enforcer.enforce_live(application).await?;
        Ok(DeleteOutcome::Pruned(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::RetentionMetrics;
    use crate::store::{InMemoryVersionStore, StoreError, StoreErrorKind};
    use chrono::{TimeDelta, Utc};
    use common::config::RetentionConfig;
    use common::testing::TestConfigBuilder;

    fn manager(store: Arc<InMemoryVersionStore>, config: RetentionConfig) -> VersionManager {
        let enforcer =
            RetentionEnforcer::new(store.clone(), config, RetentionMetrics::new()).unwrap();
        VersionManager::new(store, enforcer)
    }

    fn aged(label: &str, age_hours: i64) -> ApplicationVersion {
        ApplicationVersion::new("web", label, Utc::now() - TimeDelta::hours(age_hours))
    }

    #[tokio::test]
    async fn test_register_reads_back() {
        let store = Arc::new(InMemoryVersionStore::new());
        let manager = manager(store, TestConfigBuilder::new().build().retention);

        let version = manager
            .register(
                RegisterVersion::new("web", "v1")
                    .with_description("first")
                    .with_source_bundle("bundles", "web/v1.zip"),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(version.label, "v1");
        assert_eq!(version.description.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_register_duplicate_fails() {
        let store = Arc::new(InMemoryVersionStore::with_versions([aged("v1", 1)]));
        let manager = manager(store, TestConfigBuilder::new().build().retention);

        let err = manager
            .register(RegisterVersion::new("web", "v1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RetentionError::RegisterFailure { .. }));
    }

    #[tokio::test]
    async fn test_describe_missing_and_duplicate() {
        let store = Arc::new(InMemoryVersionStore::with_versions([aged("v1", 1)]));
        let manager = manager(store.clone(), TestConfigBuilder::new().build().retention);

        assert!(manager.describe("web", "nope").await.unwrap().is_none());

        store.insert(aged("v1", 2)).await;
        let err = manager.describe("web", "v1").await.unwrap_err();
        assert!(matches!(err, RetentionError::MultipleMatch { count: 2, .. }));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = Arc::new(InMemoryVersionStore::with_versions([
            aged("v2", 2),
            aged("v1", 1),
            aged("v3", 3),
        ]));
        let manager = manager(store.clone(), TestConfigBuilder::new().build().retention);

        let labels: Vec<_> = manager
            .list("web")
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.label)
            .collect();
        assert_eq!(labels, vec!["v1", "v2", "v3"]);

        store
            .fail_list(StoreError::new(StoreErrorKind::Unavailable, "offline"))
            .await;
        let err = manager.list("web").await.unwrap_err();
        assert!(matches!(err, RetentionError::ListFailure { .. }));
    }

    #[tokio::test]
    async fn test_update_description() {
        let store = Arc::new(InMemoryVersionStore::with_versions([aged("v1", 1)]));
        let manager = manager(store, TestConfigBuilder::new().build().retention);

        let updated = manager
            .update_description("web", "v1", "promoted")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("promoted"));

        let err = manager
            .update_description("web", "missing", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, RetentionError::UpdateFailure { .. }));
    }

    #[tokio::test]
    async fn test_unconstrained_delete_removes_only_named_version() {
        let store = Arc::new(InMemoryVersionStore::with_versions([
            aged("v1", 1),
            aged("v2", 2),
            aged("v3", 3),
        ]));
        // Dry-run does not apply to explicit single deletes
        let config = TestConfigBuilder::new().dry_run(true).build().retention;
        let manager = manager(store.clone(), config);

        let outcome = manager.delete("web", "v2").await.unwrap();
        assert!(matches!(
            outcome,
            DeleteOutcome::Single { ref label, already_gone: false } if label == "v2"
        ));
        assert_eq!(store.labels("web").await, vec!["v1", "v3"]);

        let outcome = manager.delete("web", "v2").await.unwrap();
        assert!(matches!(
            outcome,
            DeleteOutcome::Single {
                already_gone: true,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_constrained_delete_prunes_application() {
        let store = Arc::new(InMemoryVersionStore::with_versions([
            aged("v1", 1),
            aged("v2", 2),
            aged("v3", 3),
        ]));
        let config = TestConfigBuilder::new()
            .with_application("web", Some(1), None)
            .build()
            .retention;
        let manager = manager(store.clone(), config);

        let outcome = manager.delete("web", "v1").await.unwrap();
        let DeleteOutcome::Pruned(report) = outcome else {
            panic!("expected a prune");
        };
        assert_eq!(report.selected, vec!["v2", "v3"]);
        assert_eq!(store.labels("web").await, vec!["v1"]);
    }

    #[tokio::test]
    async fn test_constrained_delete_with_default_config_prunes() {
        let store = Arc::new(InMemoryVersionStore::with_versions([
            aged("v1", 1),
            aged("v2", 2),
            aged("v3", 3),
        ]));
        // Defaults leave dry-run on
        let config = RetentionConfig {
            keep_count: 1,
            ..Default::default()
        };
        assert!(config.dry_run);
        let manager = manager(store.clone(), config);

        let DeleteOutcome::Pruned(report) = manager.delete("web", "v1").await.unwrap() else {
            panic!("expected a prune");
        };
        assert!(!report.dry_run);
        assert_eq!(report.selected, vec!["v2", "v3"]);
        assert_eq!(report.deleted, 2);
        assert_eq!(store.labels("web").await, vec!["v1"]);
        assert_eq!(store.delete_calls().await.len(), 2);
    }

    #[tokio::test]
    async fn test_single_delete_failure_propagates() {
        let store = Arc::new(InMemoryVersionStore::with_versions([aged("v1", 1)]));
        store
            .fail_delete(
                "web",
                "v1",
                StoreError::new(StoreErrorKind::Rejected, "in use by environment"),
            )
            .await;
        let manager = manager(store, TestConfigBuilder::new().build().retention);

        let err = manager.delete("web", "v1").await.unwrap_err();
        assert!(matches!(err, RetentionError::DeleteFailure { .. }));
    }
}
