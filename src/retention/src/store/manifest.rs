//! JSON manifest backed version store.
//!
//! All versions live in a single file, keyed by application. Writes go to a
//! sibling temporary file that is renamed over the manifest, so a crash never
//! leaves a half-written manifest behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use common::{ApplicationVersion, RegisterVersion};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{StoreError, StoreErrorKind, StoreResult, VersionStore};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    #[serde(default)]
    applications: BTreeMap<String, Vec<ApplicationVersion>>,
}

impl Manifest {
    fn versions(&self, application: &str) -> &[ApplicationVersion] {
        self.applications
            .get(application)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[derive(Debug)]
pub struct ManifestVersionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ManifestVersionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> StoreResult<Manifest> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Manifest::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Manifest not found, starting empty");
                Ok(Manifest::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, manifest: &Manifest) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(manifest)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let written = match tokio::fs::write(&tmp, bytes).await {
            Ok(()) => tokio::fs::rename(&tmp, &self.path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            warn!(
                path = %tmp.display(),
                error = %e,
                "Manifest write failed, removing temp file"
            );
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl VersionStore for ManifestVersionStore {
    async fn create_version(&self, request: RegisterVersion) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut manifest = self.load().await?;

        let versions = manifest
            .applications
            .entry(request.application.clone())
            .or_default();
        if versions.iter().any(|v| v.label == request.label) {
            return Err(StoreError::new(
                StoreErrorKind::Rejected,
                format!(
                    "version '{}' of application '{}' already exists",
                    request.label, request.application
                ),
            ));
        }
        versions.push(request.into_version(Utc::now()));

        self.save(&manifest).await
    }

    async fn list_versions(&self, application: &str) -> StoreResult<Vec<ApplicationVersion>> {
        let _guard = self.lock.lock().await;
        let manifest = self.load().await?;
        Ok(manifest.versions(application).to_vec())
    }

    async fn describe_versions(
        &self,
        application: &str,
        labels: &[String],
    ) -> StoreResult<Vec<ApplicationVersion>> {
        let _guard = self.lock.lock().await;
        let manifest = self.load().await?;
        Ok(manifest
            .versions(application)
            .iter()
            .filter(|v| labels.contains(&v.label))
            .cloned()
            .collect())
    }

    async fn update_description(
        &self,
        application: &str,
        label: &str,
        description: &str,
    ) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut manifest = self.load().await?;

        let version = manifest
            .applications
            .get_mut(application)
            .and_then(|versions| versions.iter_mut().find(|v| v.label == label))
            .ok_or_else(|| StoreError::not_found_or_pending(application, label))?;
        version.description = Some(description.to_string());

        self.save(&manifest).await
    }

    async fn delete_version(&self, application: &str, label: &str) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut manifest = self.load().await?;

        let Some(versions) = manifest.applications.get_mut(application) else {
            return Err(StoreError::not_found_or_pending(application, label));
        };
        let before = versions.len();
        versions.retain(|v| v.label != label);
        if versions.len() == before {
            return Err(StoreError::not_found_or_pending(application, label));
        }
        if versions.is_empty() {
            manifest.applications.remove(application);
        }

        self.save(&manifest).await
    }
}
