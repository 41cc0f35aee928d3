//! Application version descriptors shared by the store adapters and the
//! retention engine.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Location of the source bundle a version was registered from.
///
/// Recorded verbatim at registration; never dereferenced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBundle {
    pub bucket: String,
    pub key: String,
}

/// One registered version of an application.
///
/// `label` is unique within `application`. `created_at` is fixed at
/// registration; only `description` changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationVersion {
    pub application: String,
    pub label: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_bundle: Option<SourceBundle>,
}

impl ApplicationVersion {
    pub fn new(
        application: impl Into<String>,
        label: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            application: application.into(),
            label: label.into(),
            created_at,
            description: None,
            source_bundle: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Age of the version relative to `now`. Negative when `created_at` lies
    /// in the future.
    pub fn age_at(&self, now: DateTime<Utc>) -> TimeDelta {
        now.signed_duration_since(self.created_at)
    }
}

/// Request to register a new application version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterVersion {
    pub application: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_bundle: Option<SourceBundle>,
}

impl RegisterVersion {
    pub fn new(application: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            label: label.into(),
            description: None,
            source_bundle: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_source_bundle(mut self, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        self.source_bundle = Some(SourceBundle {
            bucket: bucket.into(),
            key: key.into(),
        });
        self
    }

    /// Materialise the descriptor the store records for this request.
    pub fn into_version(self, created_at: DateTime<Utc>) -> ApplicationVersion {
        ApplicationVersion {
            application: self.application,
            label: self.label,
            created_at,
            description: self.description,
            source_bundle: self.source_bundle,
        }
    }
}
