//! Test configuration builder for creating test setups quickly.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::{ApplicationRetentionConfig, Configuration};

/// Builder for creating test configurations.
///
/// Starts from the defaults with dry-run disabled, since most tests want
/// deletions to actually happen.
///
/// # Example
///
/// ```rust,ignore
/// use common::testing::TestConfigBuilder;
///
/// let config = TestConfigBuilder::new()
///     .keep_count(2)
///     .with_application("web", Some(5), None)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct TestConfigBuilder {
    config: Configuration,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        let mut config = Configuration::default();
        config.retention.dry_run = false;
        Self { config }
    }

    pub fn keep_count(mut self, keep_count: usize) -> Self {
        self.config.retention.keep_count = keep_count;
        self
    }

    pub fn keep_period(mut self, keep_period: Duration) -> Self {
        self.config.retention.keep_period = keep_period;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.retention.dry_run = dry_run;
        self
    }

    /// Add an application-level retention override.
    pub fn with_application(
        mut self,
        application: &str,
        keep_count: Option<usize>,
        keep_period: Option<Duration>,
    ) -> Self {
        self.config.retention.applications.insert(
            application.to_string(),
            ApplicationRetentionConfig {
                keep_count,
                keep_period,
            },
        );
        self
    }

    pub fn manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.store.manifest_path = path.into();
        self
    }

    pub fn build(self) -> Configuration {
        self.config
    }
}
