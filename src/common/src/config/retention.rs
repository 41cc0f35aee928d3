//! Retention configuration with per-application overrides.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Retention policy configuration.
///
/// A zero `keep_count` or `keep_period` disables that constraint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Number of most recent versions always kept.
    ///
    /// Env: SHELFLIFE__RETENTION__KEEP_COUNT
    #[serde(default)]
    pub keep_count: usize,

    /// Versions beyond the count floor older than this are deleted.
    ///
    /// Env: SHELFLIFE__RETENTION__KEEP_PERIOD
    #[serde(with = "humantime_serde", default)]
    pub keep_period: Duration,

    /// Application-specific overrides.
    #[serde(default)]
    pub applications: HashMap<String, ApplicationRetentionConfig>,

    /// Dry-run mode: log what would be deleted without deleting it.
    ///
    /// Env: SHELFLIFE__RETENTION__DRY_RUN
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
}

fn default_dry_run() -> bool {
    true
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            keep_count: 0,
            keep_period: Duration::ZERO,
            applications: HashMap::new(),
            dry_run: default_dry_run(),
        }
    }
}

impl RetentionConfig {
    /// Validate the retention configuration.
    ///
    /// Checks:
    /// - Periods fit into a signed timestamp delta
    /// - Override keys name an application
    pub fn validate(&self) -> Result<(), RetentionConfigError> {
        validate_period(self.keep_period)?;

        for (application, overrides) in &self.applications {
            if application.trim().is_empty() {
                return Err(RetentionConfigError::EmptyApplicationName);
            }
            overrides
                .validate()
                .map_err(|e| RetentionConfigError::InvalidApplicationOverride {
                    application: application.clone(),
                    source: Box::new(e),
                })?;
        }

        Ok(())
    }
}

/// Application-level override. Unset fields fall back to the global value.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ApplicationRetentionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_count: Option<usize>,

    #[serde(
        with = "humantime_serde",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub keep_period: Option<Duration>,
}

impl ApplicationRetentionConfig {
    pub fn validate(&self) -> Result<(), RetentionConfigError> {
        if let Some(period) = self.keep_period {
            validate_period(period)?;
        }
        Ok(())
    }
}

fn validate_period(period: Duration) -> Result<(), RetentionConfigError> {
    chrono::TimeDelta::from_std(period)
        .map(|_| ())
        .map_err(|_| RetentionConfigError::InvalidKeepPeriod(period))
}

/// Errors that can occur during retention configuration validation.
#[derive(Error, Debug)]
pub enum RetentionConfigError {
    #[error("Invalid keep period {0:?}: out of range")]
    InvalidKeepPeriod(Duration),

    #[error("Application override with empty name")]
    EmptyApplicationName,

    #[error("Invalid retention configuration for application '{application}': {source}")]
    InvalidApplicationOverride {
        application: String,
        source: Box<RetentionConfigError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid_and_unconstrained() {
        let config = RetentionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.keep_count, 0);
        assert_eq!(config.keep_period, Duration::ZERO);
        assert!(config.dry_run);
    }

    #[test]
    fn test_huge_period_is_invalid() {
        let config = RetentionConfig {
            keep_period: Duration::from_secs(u64::MAX),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RetentionConfigError::InvalidKeepPeriod(_))
        ));
    }

    #[test]
    fn test_application_override_validation() {
        let mut config = RetentionConfig::default();
        config.applications.insert(
            "web".to_string(),
            ApplicationRetentionConfig {
                keep_count: Some(5),
                keep_period: Some(Duration::from_secs(u64::MAX)),
            },
        );

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("'web'"));
    }

    #[test]
    fn test_empty_application_name_is_rejected() {
        let mut config = RetentionConfig::default();
        config
            .applications
            .insert("  ".to_string(), ApplicationRetentionConfig::default());

        assert!(matches!(
            config.validate(),
            Err(RetentionConfigError::EmptyApplicationName)
        ));
    }

    #[test]
    fn test_humantime_periods_deserialize() {
        let config: RetentionConfig = serde_json::from_value(serde_json::json!({
            "keep_count": 3,
            "keep_period": "5h",
            "applications": {
                "api": { "keep_period": "30days" }
            }
        }))
        .unwrap();

        assert_eq!(config.keep_count, 3);
        assert_eq!(config.keep_period, Duration::from_secs(5 * 3600));
        assert!(config.dry_run);

        let api = config.applications.get("api").unwrap();
        assert_eq!(api.keep_count, None);
        assert_eq!(api.keep_period, Some(Duration::from_secs(30 * 86400)));
    }
}
