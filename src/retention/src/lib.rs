//! Version retention for Shelflife.
//!
//! Decides which versions of an application a retention policy no longer
//! keeps and deletes them through a [`VersionStore`].
//!
//! ## Architecture
//!
//! - `selector`: pure selection of the versions to delete
//! - `pruner`: sequential deletion that tolerates already-removed versions
//! - `policy`: policy resolution with per-application overrides
//! - `enforcer`: list, select and prune as one run
//! - `lifecycle`: register/describe/update passthrough and policy-aware delete
//! - `store`: the store boundary plus manifest and in-memory implementations
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use common::config::RetentionConfig;
//! use retention::{ManifestVersionStore, RetentionEnforcer, RetentionMetrics};
//!
//! # async fn run() -> Result<(), retention::RetentionError> {
//! let store = Arc::new(ManifestVersionStore::new(".data/manifest.json"));
//! let config = RetentionConfig::default();
//! let enforcer = RetentionEnforcer::new(store, config, RetentionMetrics::new())?;
//!
//! let report = enforcer.enforce("web").await?;
//! println!("selected {} versions", report.selected.len());
//! # Ok(())
//! # }
//! ```

pub mod enforcer;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod policy;
pub mod pruner;
pub mod selector;
pub mod store;

// Re-export commonly used types
pub use enforcer::{PruneReport, RetentionEnforcer};
pub use error::RetentionError;
pub use lifecycle::{DeleteOutcome, VersionManager};
pub use metrics::RetentionMetrics;
pub use policy::{
    ResolvedPolicy, RetentionPolicy, RetentionPolicyError, RetentionPolicyResolver,
    RetentionPolicySource,
};
pub use pruner::{PruneTally, Pruner};
pub use selector::select_versions_to_delete;
pub use store::{ManifestVersionStore, StoreError, StoreErrorKind, StoreResult, VersionStore};
#[cfg(any(test, feature = "testing"))]
pub use store::InMemoryVersionStore;
