//! Boundary to the external version store.
//!
//! The retention engine never talks to a concrete backend; everything goes
//! through [`VersionStore`]. Errors carry a [`StoreErrorKind`] so callers can
//! tell a benign "already gone" apart from a real failure without inspecting
//! messages.

use async_trait::async_trait;
use common::{ApplicationVersion, RegisterVersion};
use std::fmt;
use thiserror::Error;

pub mod manifest;
#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use manifest::ManifestVersionStore;
#[cfg(any(test, feature = "testing"))]
pub use memory::InMemoryVersionStore;

/// Classification of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// Target does not exist, or the store is already removing it.
    NotFoundOrPending,
    /// Request rate exceeded.
    Throttled,
    /// Store could not be reached.
    Unavailable,
    /// Request was understood and refused.
    Rejected,
    Io,
    Serialization,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreErrorKind::NotFoundOrPending => "not found or pending deletion",
            StoreErrorKind::Throttled => "throttled",
            StoreErrorKind::Unavailable => "unavailable",
            StoreErrorKind::Rejected => "rejected",
            StoreErrorKind::Io => "i/o error",
            StoreErrorKind::Serialization => "serialization error",
        };
        f.write_str(name)
    }
}

/// Error returned by [`VersionStore`] operations.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct StoreError {
    kind: StoreErrorKind,
    message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found_or_pending(application: &str, label: &str) -> Self {
        Self::new(
            StoreErrorKind::NotFoundOrPending,
            format!("version '{label}' of application '{application}'"),
        )
    }

    pub fn kind(&self) -> StoreErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when a delete can be treated as having succeeded.
    pub fn is_already_gone(&self) -> bool {
        self.kind == StoreErrorKind::NotFoundOrPending
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::new(StoreErrorKind::Io, err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(StoreErrorKind::Serialization, err.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Operations the retention engine needs from a version store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Register a new version.
    async fn create_version(&self, request: RegisterVersion) -> StoreResult<()>;

    /// Fetch every version currently recorded for `application`.
    async fn list_versions(&self, application: &str) -> StoreResult<Vec<ApplicationVersion>>;

    /// Fetch the versions of `application` carrying one of `labels`.
    async fn describe_versions(
        &self,
        application: &str,
        labels: &[String],
    ) -> StoreResult<Vec<ApplicationVersion>>;

    /// Replace the free-text description of a version.
    async fn update_description(
        &self,
        application: &str,
        label: &str,
        description: &str,
    ) -> StoreResult<()>;

    /// Delete a single version.
    ///
    /// Returns a [`StoreErrorKind::NotFoundOrPending`] error when the version
    /// is absent or already being removed.
    async fn delete_version(&self, application: &str, label: &str) -> StoreResult<()>;
}
