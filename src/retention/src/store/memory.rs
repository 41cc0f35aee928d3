use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use common::{ApplicationVersion, RegisterVersion};
use tokio::sync::Mutex;

use super::{StoreError, StoreErrorKind, StoreResult, VersionStore};

type VersionKey = (String, String);

fn key(application: &str, label: &str) -> VersionKey {
    (application.to_string(), label.to_string())
}

#[derive(Debug, Default)]
struct MemoryState {
    versions: Vec<ApplicationVersion>,
    delete_calls: Vec<VersionKey>,
    pending: HashSet<VersionKey>,
    delete_failures: HashMap<VersionKey, StoreError>,
    list_failure: Option<StoreError>,
}

/// In-memory version store with scripted failures, for tests.
///
/// Every delete request is recorded, including the ones that fail.
#[derive(Debug, Default)]
pub struct InMemoryVersionStore {
    state: Mutex<MemoryState>,
}

impl InMemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_versions(versions: impl IntoIterator<Item = ApplicationVersion>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                versions: versions.into_iter().collect(),
                ..Default::default()
            }),
        }
    }

    /// Insert a version as-is, without the uniqueness check `create_version` performs.
    pub async fn insert(&self, version: ApplicationVersion) {
        self.state.lock().await.versions.push(version);
    }

    /// Make the store report `label` as already being deleted.
    pub async fn mark_pending(&self, application: &str, label: &str) {
        self.state
            .lock()
            .await
            .pending
            .insert(key(application, label));
    }

    /// Fail the next and every later delete of `label` with `error`.
    pub async fn fail_delete(&self, application: &str, label: &str, error: StoreError) {
        self.state
            .lock()
            .await
            .delete_failures
            .insert(key(application, label), error);
    }

    /// Fail every listing with `error`.
    pub async fn fail_list(&self, error: StoreError) {
        self.state.lock().await.list_failure = Some(error);
    }

    /// Delete requests received so far, in order.
    pub async fn delete_calls(&self) -> Vec<(String, String)> {
        self.state.lock().await.delete_calls.clone()
    }

    /// Labels currently stored for `application`, in insertion order.
    pub async fn labels(&self, application: &str) -> Vec<String> {
        self.state
            .lock()
            .await
            .versions
            .iter()
            .filter(|v| v.application == application)
            .map(|v| v.label.clone())
            .collect()
    }
}

#[async_trait]
impl VersionStore for InMemoryVersionStore {
    async fn create_version(&self, request: RegisterVersion) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if state
            .versions
            .iter()
            .any(|v| v.application == request.application && v.label == request.label)
        {
            return Err(StoreError::new(
                StoreErrorKind::Rejected,
                format!(
                    "version '{}' of application '{}' already exists",
                    request.label, request.application
                ),
            ));
        }
        state.versions.push(request.into_version(Utc::now()));
        Ok(())
    }

    async fn list_versions(&self, application: &str) -> StoreResult<Vec<ApplicationVersion>> {
        let state = self.state.lock().await;
        if let Some(error) = &state.list_failure {
            return Err(error.clone());
        }
        Ok(state
            .versions
            .iter()
            .filter(|v| v.application == application)
            .filter(|v| !state.pending.contains(&key(&v.application, &v.label)))
            .cloned()
            .collect())
    }

    async fn describe_versions(
        &self,
        application: &str,
        labels: &[String],
    ) -> StoreResult<Vec<ApplicationVersion>> {
        let state = self.state.lock().await;
        if let Some(error) = &state.list_failure {
            return Err(error.clone());
        }
        Ok(state
            .versions
            .iter()
            .filter(|v| v.application == application && labels.contains(&v.label))
            .cloned()
            .collect())
    }

    async fn update_description(
        &self,
        application: &str,
        label: &str,
        description: &str,
    ) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let version = state
            .versions
            .iter_mut()
            .find(|v| v.application == application && v.label == label)
            .ok_or_else(|| StoreError::not_found_or_pending(application, label))?;
        version.description = Some(description.to_string());
        Ok(())
    }

    async fn delete_version(&self, application: &str, label: &str) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let target = key(application, label);
        state.delete_calls.push(target.clone());

        if let Some(error) = state.delete_failures.get(&target) {
            return Err(error.clone());
        }

        let before = state.versions.len();
        state
            .versions
            .retain(|v| !(v.application == application && v.label == label));

        if state.pending.remove(&target) || state.versions.len() == before {
            return Err(StoreError::not_found_or_pending(application, label));
        }
        Ok(())
    }
}
